use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::navigation::{GroupInput, ItemInput, RoleInput};
use crate::types::{Role, Token};

fn default_true() -> bool {
    true
}

/// Body of `POST` and `PUT` on `/admin/navigation/groups`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
}

impl From<GroupRequest> for GroupInput {
    fn from(req: GroupRequest) -> Self {
        GroupInput {
            name: req.name,
            description: req.description,
            order: req.order,
            is_active: req.is_active,
        }
    }
}

/// Body of `POST` and `PUT` on `/admin/navigation`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, alias = "group_id")]
    pub group_id: Option<String>,
    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<String>,
}

impl From<ItemRequest> for ItemInput {
    fn from(req: ItemRequest) -> Self {
        ItemInput {
            label: req.label,
            icon: req.icon,
            url: req.url,
            order: req.order,
            group_id: req.group_id,
            parent_id: req.parent_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteItemParams {
    #[serde(default)]
    pub cascade_children: bool,
}

/// Full-replace body of `PUT /admin/navigation/roles/{role_id}`.
#[derive(Debug, Deserialize)]
pub struct AssignNavigationRequest {
    #[serde(rename = "navigationItemIds", alias = "navigation_item_ids")]
    pub navigation_item_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleAssignmentsResponse {
    pub role_id: String,
    pub navigation_item_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub role_id: String,
    pub navigation_item_id: String,
    pub created: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default, alias = "is_system")]
    pub is_system: bool,
}

impl From<CreateRoleRequest> for RoleInput {
    fn from(req: CreateRoleRequest) -> Self {
        RoleInput {
            name: req.name,
            is_system: req.is_system,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoleTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        TokenResponse {
            id: token.id,
            is_admin: token.is_admin,
            role_id: token.role_id,
            created_at: token.created_at,
            expires_at: token.expires_at,
            last_used_at: token.last_used_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}

/// Body of `GET /navigation`.
#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub role: Role,
    pub groups: Vec<crate::navigation::NavigationSection>,
}
