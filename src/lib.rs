//! # Navauth
//!
//! Role-based navigation authorization, usable both as a standalone binary
//! and as a library.
//!
//! Administrators define navigation groups and items and assign items to
//! roles. A client holding a role token asks for its menu and receives only
//! the items that role may see, grouped and ordered.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! navauth = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use navauth::server::{AppState, create_router};
//! use navauth::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/navauth.db")?;
//! store.initialize()?;
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `navauth` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod navigation;
pub mod server;
pub mod store;
pub mod types;
