//! Resolves the menu a role is allowed to see.
//!
//! Visibility is strictly per item: a role sees an item only when the item
//! itself is assigned to it. Two filters apply on top of the raw
//! assignments and are not errors:
//!
//! - items whose group is inactive (or who have no group) are left out;
//! - a child is shown only nested under its parent, so a child whose parent
//!   is not assigned to the same role is left out. Children are never
//!   promoted to the top level of a group.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{AssignedItem, GroupSummary, NavigationItem, Placement};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub order: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavigationEntry>,
}

impl From<NavigationItem> for NavigationEntry {
    fn from(item: NavigationItem) -> Self {
        Self {
            id: item.id,
            label: item.label,
            icon: item.icon,
            url: item.url,
            order: item.order,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSection {
    pub group: GroupSummary,
    pub items: Vec<NavigationEntry>,
}

pub struct NavigationAuthorizer {
    store: Arc<dyn Store>,
}

impl NavigationAuthorizer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn tree_for_role(&self, role_id: &str) -> Result<Vec<NavigationSection>> {
        if self.store.get_role(role_id)?.is_none() {
            return Err(Error::NotFound("role"));
        }

        let assigned = self.store.list_items_for_role(role_id)?;
        let assigned_count = assigned.len();
        let tree = build_tree(assigned);

        tracing::debug!(
            role_id = %role_id,
            assigned = assigned_count,
            sections = tree.len(),
            "resolved navigation tree"
        );
        Ok(tree)
    }
}

fn entry_order(a: &NavigationEntry, b: &NavigationEntry) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.id.cmp(&b.id))
}

/// Turns the flat assignment list into ordered sections: groups by
/// `(order, name)`, items and children by `(order, label)`.
pub fn build_tree(assigned: Vec<AssignedItem>) -> Vec<NavigationSection> {
    let mut sections: HashMap<String, NavigationSection> = HashMap::new();

    for AssignedItem {
        item,
        group,
        children,
    } in assigned
    {
        if matches!(item.placement, Placement::Child { .. }) {
            continue;
        }
        let Some(group) = group.filter(|g| g.is_active) else {
            continue;
        };

        let mut children: Vec<NavigationEntry> =
            children.into_iter().map(NavigationEntry::from).collect();
        children.sort_by(entry_order);

        let entry = NavigationEntry {
            children,
            ..NavigationEntry::from(item)
        };

        sections
            .entry(group.id.clone())
            .or_insert_with(|| NavigationSection {
                group,
                items: Vec::new(),
            })
            .items
            .push(entry);
    }

    let mut sections: Vec<NavigationSection> = sections.into_values().collect();
    for section in &mut sections {
        section.items.sort_by(entry_order);
    }
    sections.sort_by(|a, b| {
        a.group
            .order
            .cmp(&b.group.order)
            .then_with(|| a.group.name.cmp(&b.group.name))
    });
    sections
}
