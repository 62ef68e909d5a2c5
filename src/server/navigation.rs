use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::auth::RequireRole;
use crate::server::AppState;
use crate::server::dto::NavigationResponse;
use crate::server::response::{ApiError, ApiResponse};

pub fn navigation_router() -> Router<Arc<AppState>> {
    Router::new().route("/navigation", get(get_navigation))
}

/// The menu for the role bound to the caller's token.
async fn get_navigation(
    RequireRole { role, .. }: RequireRole,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let groups = state.authorizer.tree_for_role(&role.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(NavigationResponse { role, groups })))
}
