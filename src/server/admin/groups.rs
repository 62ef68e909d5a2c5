use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::GroupRequest;
use crate::server::response::{ApiError, ApiResponse};

pub async fn create_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<GroupRequest>,
) -> impl IntoResponse {
    let group = state.admin.create_group(req.into())?;
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

pub async fn list_groups(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let groups = state.admin.list_groups()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(groups)))
}

pub async fn get_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let group = state.admin.get_group(&id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(group)))
}

pub async fn update_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<GroupRequest>,
) -> impl IntoResponse {
    let group = state.admin.update_group(&id, req.into())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(group)))
}

pub async fn delete_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.admin.delete_group(&id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
