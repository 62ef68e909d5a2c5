mod helpers;
mod middleware;
mod token;

pub use helpers::issue_token;
pub use middleware::{AuthError, RequireAdmin, RequireRole};
pub use token::{IssuedToken, TokenGenerator, parse_token};
