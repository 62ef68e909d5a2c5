use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{DeleteItemParams, ItemRequest};
use crate::server::response::{ApiError, ApiResponse};

pub async fn create_item(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ItemRequest>,
) -> impl IntoResponse {
    let item = state.admin.create_item(req.into())?;
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

pub async fn list_items(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let items = state.admin.list_items()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(items)))
}

pub async fn get_item(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let item = state.admin.get_item(&id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(item)))
}

pub async fn update_item(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> impl IntoResponse {
    let item = state.admin.update_item(&id, req.into())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(item)))
}

pub async fn delete_item(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteItemParams>,
) -> impl IntoResponse {
    state.admin.delete_item(&id, params.cascade_children)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
