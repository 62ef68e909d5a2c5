mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every mutating call is its own transaction; callers never see partial
/// writes.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Group operations
    fn create_group(&self, group: &NavigationGroup) -> Result<()>;
    fn get_group(&self, id: &str) -> Result<Option<NavigationGroup>>;
    fn list_groups(&self) -> Result<Vec<NavigationGroup>>;
    fn update_group(&self, group: &NavigationGroup) -> Result<()>;
    /// Fails with `Conflict` while any item still belongs to the group.
    fn delete_group(&self, id: &str) -> Result<bool>;
    /// Inserts or updates in place, keyed by `name`. Returns the stored row.
    fn upsert_group(&self, group: &NavigationGroup) -> Result<NavigationGroup>;

    // Item operations
    fn create_item(&self, item: &NavigationItem) -> Result<()>;
    fn get_item(&self, id: &str) -> Result<Option<NavigationItem>>;
    fn list_items(&self) -> Result<Vec<NavigationItem>>;
    fn update_item(&self, item: &NavigationItem) -> Result<()>;
    /// Removes the item and its assignments. Children block the delete with
    /// `Conflict` unless `cascade_children` is set.
    fn delete_item(&self, id: &str, cascade_children: bool) -> Result<bool>;
    /// Inserts or updates in place, keyed by `(placement, label)`.
    fn upsert_item(&self, item: &NavigationItem) -> Result<NavigationItem>;

    // Role operations
    fn create_role(&self, role: &Role) -> Result<()>;
    fn get_role(&self, id: &str) -> Result<Option<Role>>;
    fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    fn list_roles(&self) -> Result<Vec<Role>>;
    fn delete_role(&self, id: &str) -> Result<bool>;
    fn upsert_role(&self, role: &Role) -> Result<Role>;

    // Role-navigation M2M operations
    /// Idempotent; returns true when a new row was inserted.
    fn upsert_assignment(&self, role_id: &str, item_id: &str) -> Result<bool>;
    fn remove_assignment(&self, role_id: &str, item_id: &str) -> Result<bool>;
    /// Replaces the role's whole assignment set in one transaction and
    /// returns the set as committed.
    fn replace_assignments(
        &self,
        role_id: &str,
        item_ids: &[String],
    ) -> Result<Vec<RoleNavigation>>;
    fn list_role_assignments(&self, role_id: &str) -> Result<Vec<RoleNavigation>>;
    fn list_items_for_role(&self, role_id: &str) -> Result<Vec<AssignedItem>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self) -> Result<Vec<Token>>;
    fn list_role_tokens(&self, role_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn has_admin_token(&self) -> Result<bool>;
}
