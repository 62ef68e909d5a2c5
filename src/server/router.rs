use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::navigation::navigation_router;
use crate::navigation::{NavigationAdmin, NavigationAuthorizer};
use crate::store::Store;

/// Shared handler state. The store is constructed once by the caller and
/// injected; there is no process-wide database handle.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub admin: NavigationAdmin,
    pub authorizer: NavigationAuthorizer,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            admin: NavigationAdmin::new(store.clone()),
            authorizer: NavigationAuthorizer::new(store.clone()),
            store,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", navigation_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
