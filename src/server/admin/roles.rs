use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};

use crate::auth::{RequireAdmin, issue_token};
use crate::server::AppState;
use crate::server::dto::{
    CreateRoleRequest, CreateRoleTokenRequest, CreateTokenResponse, TokenResponse,
};
use crate::server::response::{ApiError, ApiResponse};

pub async fn create_role(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> impl IntoResponse {
    let role = state.admin.create_role(req.into())?;
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(role))))
}

pub async fn list_roles(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let roles = state.admin.list_roles()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(roles)))
}

pub async fn get_role(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let role = state.admin.get_role(&id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(role)))
}

pub async fn delete_role(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.admin.delete_role(&id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_role_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let role = state.admin.get_role(&id)?;
    let tokens = state.store.list_role_tokens(&role.id)?;

    let responses: Vec<TokenResponse> = tokens.into_iter().map(TokenResponse::from).collect();
    Ok::<_, ApiError>(Json(ApiResponse::success(responses)))
}

pub async fn create_role_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateRoleTokenRequest>,
) -> impl IntoResponse {
    let role = state.admin.get_role(&id)?;

    if req.expires_in_seconds.is_some_and(|s| s <= 0) {
        return Err(ApiError::bad_request(
            "expires_in_seconds must be positive",
        ));
    }
    let expires_at = match req.expires_in_seconds {
        Some(s) => Some(
            Duration::try_seconds(s)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .ok_or_else(|| ApiError::bad_request("expires_in_seconds is too large"))?,
        ),
        None => None,
    };

    let (token, raw_token) = issue_token(state.store.as_ref(), Some(role.id), expires_at)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateTokenResponse {
            token: raw_token,
            metadata: token.into(),
        })),
    ))
}
