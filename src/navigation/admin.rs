use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::validation::{
    validate_group_name, validate_icon, validate_label, validate_order, validate_role_name,
    validate_url,
};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{NavigationGroup, NavigationItem, Placement, Role, RoleNavigation};

#[derive(Debug, Clone)]
pub struct GroupInput {
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
    pub is_active: bool,
}

impl GroupInput {
    pub(super) fn validate(&self) -> Result<()> {
        validate_group_name(&self.name)?;
        validate_order(self.order)
    }
}

#[derive(Debug, Clone)]
pub struct ItemInput {
    pub label: String,
    pub icon: Option<String>,
    pub url: Option<String>,
    pub order: i32,
    pub group_id: Option<String>,
    pub parent_id: Option<String>,
}

impl ItemInput {
    pub(super) fn validate(&self) -> Result<()> {
        validate_label(&self.label)?;
        validate_icon(self.icon.as_deref())?;
        validate_url(self.url.as_deref())?;
        validate_order(self.order)
    }

    fn placement(&self) -> Result<Placement> {
        match (&self.group_id, &self.parent_id) {
            (Some(_), Some(_)) => Err(Error::Validation(
                "An item belongs to a group or to a parent item, not both".to_string(),
            )),
            (group_id, None) => Ok(Placement::TopLevel {
                group_id: group_id.clone(),
            }),
            (None, Some(parent_id)) => Ok(Placement::Child {
                parent_id: parent_id.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleInput {
    pub name: String,
    pub is_system: bool,
}

impl RoleInput {
    pub(super) fn validate(&self) -> Result<()> {
        validate_role_name(&self.name)
    }
}

/// The one entry point for changing navigation data. HTTP handlers and the
/// seeder both go through here.
#[derive(Clone)]
pub struct NavigationAdmin {
    store: Arc<dyn Store>,
}

impl NavigationAdmin {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // Groups

    pub fn create_group(&self, input: GroupInput) -> Result<NavigationGroup> {
        input.validate()?;

        let now = Utc::now();
        let group = NavigationGroup {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            order: input.order,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.store.create_group(&group)?;

        tracing::info!(group_id = %group.id, name = %group.name, "navigation group created");
        Ok(group)
    }

    pub fn get_group(&self, id: &str) -> Result<NavigationGroup> {
        self.store
            .get_group(id)?
            .ok_or(Error::NotFound("navigation group"))
    }

    pub fn list_groups(&self) -> Result<Vec<NavigationGroup>> {
        self.store.list_groups()
    }

    pub fn update_group(&self, id: &str, input: GroupInput) -> Result<NavigationGroup> {
        input.validate()?;

        let group = NavigationGroup {
            name: input.name,
            description: input.description,
            order: input.order,
            is_active: input.is_active,
            updated_at: Utc::now(),
            ..self.get_group(id)?
        };
        self.store.update_group(&group)?;

        tracing::info!(group_id = %group.id, "navigation group updated");
        Ok(group)
    }

    pub fn delete_group(&self, id: &str) -> Result<()> {
        if !self.store.delete_group(id)? {
            return Err(Error::NotFound("navigation group"));
        }
        tracing::info!(group_id = %id, "navigation group deleted");
        Ok(())
    }

    pub fn upsert_group(&self, input: GroupInput) -> Result<NavigationGroup> {
        input.validate()?;

        let now = Utc::now();
        self.store.upsert_group(&NavigationGroup {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            order: input.order,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    // Items

    pub fn create_item(&self, input: ItemInput) -> Result<NavigationItem> {
        input.validate()?;
        let placement = input.placement()?;

        let now = Utc::now();
        let item = NavigationItem {
            id: Uuid::new_v4().to_string(),
            label: input.label,
            icon: input.icon,
            url: input.url,
            order: input.order,
            placement,
            created_at: now,
            updated_at: now,
        };
        self.store.create_item(&item)?;

        tracing::info!(item_id = %item.id, label = %item.label, "navigation item created");
        Ok(item)
    }

    pub fn get_item(&self, id: &str) -> Result<NavigationItem> {
        self.store
            .get_item(id)?
            .ok_or(Error::NotFound("navigation item"))
    }

    pub fn list_items(&self) -> Result<Vec<NavigationItem>> {
        self.store.list_items()
    }

    pub fn update_item(&self, id: &str, input: ItemInput) -> Result<NavigationItem> {
        input.validate()?;
        let placement = input.placement()?;

        let item = NavigationItem {
            label: input.label,
            icon: input.icon,
            url: input.url,
            order: input.order,
            placement,
            updated_at: Utc::now(),
            ..self.get_item(id)?
        };
        self.store.update_item(&item)?;

        tracing::info!(item_id = %item.id, "navigation item updated");
        Ok(item)
    }

    pub fn delete_item(&self, id: &str, cascade_children: bool) -> Result<()> {
        if !self.store.delete_item(id, cascade_children)? {
            return Err(Error::NotFound("navigation item"));
        }
        tracing::info!(item_id = %id, cascade_children, "navigation item deleted");
        Ok(())
    }

    pub fn upsert_item(&self, input: ItemInput) -> Result<NavigationItem> {
        input.validate()?;
        let placement = input.placement()?;

        let now = Utc::now();
        self.store.upsert_item(&NavigationItem {
            id: Uuid::new_v4().to_string(),
            label: input.label,
            icon: input.icon,
            url: input.url,
            order: input.order,
            placement,
            created_at: now,
            updated_at: now,
        })
    }

    // Roles

    pub fn create_role(&self, input: RoleInput) -> Result<Role> {
        input.validate()?;

        let role = Role {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            is_system: input.is_system,
            created_at: Utc::now(),
        };
        self.store.create_role(&role)?;

        tracing::info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub fn get_role(&self, id: &str) -> Result<Role> {
        self.store.get_role(id)?.ok_or(Error::NotFound("role"))
    }

    pub fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.store.get_role_by_name(name)
    }

    pub fn list_roles(&self) -> Result<Vec<Role>> {
        self.store.list_roles()
    }

    pub fn delete_role(&self, id: &str) -> Result<()> {
        if !self.store.delete_role(id)? {
            return Err(Error::NotFound("role"));
        }
        tracing::info!(role_id = %id, "role deleted");
        Ok(())
    }

    pub fn upsert_role(&self, input: RoleInput) -> Result<Role> {
        input.validate()?;

        self.store.upsert_role(&Role {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            is_system: input.is_system,
            created_at: Utc::now(),
        })
    }

    // Assignments

    /// Full replace: afterwards the role sees exactly `item_ids`. An empty
    /// slice clears the role's navigation. Concurrent calls for one role are
    /// serialized by the store; the last to commit wins.
    pub fn assign_navigation_to_role(
        &self,
        role_id: &str,
        item_ids: &[String],
    ) -> Result<Vec<RoleNavigation>> {
        let assignments = self.store.replace_assignments(role_id, item_ids)?;

        tracing::info!(
            role_id = %role_id,
            items = assignments.len(),
            "role navigation replaced"
        );
        Ok(assignments)
    }

    /// Additive: grants one item, leaving the rest untouched. Returns false
    /// when the role already had it.
    pub fn upsert_assignment(&self, role_id: &str, item_id: &str) -> Result<bool> {
        let created = self.store.upsert_assignment(role_id, item_id)?;
        if created {
            tracing::info!(role_id = %role_id, item_id = %item_id, "navigation item assigned");
        }
        Ok(created)
    }

    pub fn remove_assignment(&self, role_id: &str, item_id: &str) -> Result<()> {
        if !self.store.remove_assignment(role_id, item_id)? {
            return Err(Error::NotFound("assignment"));
        }
        tracing::info!(role_id = %role_id, item_id = %item_id, "navigation item unassigned");
        Ok(())
    }

    pub fn role_assignments(&self, role_id: &str) -> Result<Vec<RoleNavigation>> {
        self.get_role(role_id)?;
        self.store.list_role_assignments(role_id)
    }
}
