mod admin;
pub mod dto;
mod navigation;
pub mod response;
mod router;

pub use admin::admin_router;
pub use navigation::navigation_router;
pub use router::{AppState, create_router};
