use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationGroup {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where an item hangs in the menu. Nesting is bounded to one level: the
/// parent of a `Child` is always a `TopLevel` item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Placement {
    Child { parent_id: String },
    TopLevel { group_id: Option<String> },
}

impl Placement {
    #[must_use]
    pub fn group_id(&self) -> Option<&str> {
        match self {
            Placement::TopLevel { group_id } => group_id.as_deref(),
            Placement::Child { .. } => None,
        }
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Placement::Child { parent_id } => Some(parent_id),
            Placement::TopLevel { .. } => None,
        }
    }

    /// Rebuilds a placement from the two nullable columns it is stored in.
    #[must_use]
    pub fn from_columns(group_id: Option<String>, parent_id: Option<String>) -> Self {
        match parent_id {
            Some(parent_id) => Placement::Child { parent_id },
            None => Placement::TopLevel { group_id },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub order: i32,
    #[serde(flatten)]
    pub placement: Placement,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleNavigation {
    pub role_id: String,
    pub navigation_item_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// The group an assigned item resolves to; children resolve through their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub order: i32,
    pub is_active: bool,
}

/// One row of `list_items_for_role`: an assigned item, its effective group,
/// and the children of it that are assigned to the same role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedItem {
    pub item: NavigationItem,
    pub group: Option<GroupSummary>,
    pub children: Vec<NavigationItem>,
}
