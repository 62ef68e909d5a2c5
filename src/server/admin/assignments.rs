use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{AssignNavigationRequest, AssignmentResponse, RoleAssignmentsResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::RoleNavigation;

fn assignments_response(role_id: String, rows: Vec<RoleNavigation>) -> RoleAssignmentsResponse {
    RoleAssignmentsResponse {
        role_id,
        navigation_item_ids: rows.into_iter().map(|r| r.navigation_item_id).collect(),
    }
}

pub async fn list_role_navigation(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> impl IntoResponse {
    let rows = state.admin.role_assignments(&role_id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(assignments_response(role_id, rows))))
}

/// Full replace of the role's navigation.
pub async fn assign_navigation_to_role(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    Json(req): Json<AssignNavigationRequest>,
) -> impl IntoResponse {
    let rows = state
        .admin
        .assign_navigation_to_role(&role_id, &req.navigation_item_ids)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(assignments_response(role_id, rows))))
}

/// Adds a single item; existing assignments are kept.
pub async fn upsert_assignment(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((role_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let created = state.admin.upsert_assignment(&role_id, &item_id)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok::<_, ApiError>((
        status,
        Json(ApiResponse::success(AssignmentResponse {
            role_id,
            navigation_item_id: item_id,
            created,
        })),
    ))
}

pub async fn remove_assignment(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((role_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state.admin.remove_assignment(&role_id, &item_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
