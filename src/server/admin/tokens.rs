use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::TokenResponse;
use crate::server::response::{ApiError, ApiResponse};

pub async fn list_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let tokens = state.store.list_tokens()?;

    let responses: Vec<TokenResponse> = tokens.into_iter().map(TokenResponse::from).collect();
    Ok::<_, ApiError>(Json(ApiResponse::success(responses)))
}

pub async fn get_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(&id)?
        .ok_or_else(|| ApiError::not_found("Token not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(TokenResponse::from(token))))
}

pub async fn delete_token(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = state
        .store
        .get_token_by_id(&id)?
        .ok_or_else(|| ApiError::not_found("Token not found"))?;

    if token.id == admin.0.id {
        return Err(ApiError::bad_request("Cannot delete current token"));
    }

    state.store.delete_token(&token.id)?;
    tracing::info!(token_id = %token.id, "token revoked");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
