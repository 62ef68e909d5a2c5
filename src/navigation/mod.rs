pub mod admin;
pub mod authorizer;
pub mod seed;
mod validation;

pub use admin::{GroupInput, ItemInput, NavigationAdmin, RoleInput};
pub use authorizer::{NavigationAuthorizer, NavigationEntry, NavigationSection, build_tree};
pub use seed::{NavigationManifest, SeedReport, seed};
