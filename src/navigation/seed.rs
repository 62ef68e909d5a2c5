//! Declarative navigation seeding.
//!
//! A manifest lists roles, groups, items and which roles see which items.
//! Applying it is repeatable: every row is upserted by its natural key
//! (role and group by name, item by placement and label) and updated in
//! place, and assignments are only ever added.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::admin::{GroupInput, ItemInput, NavigationAdmin, RoleInput};
use crate::error::{Error, Result};

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationManifest {
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleEntry {
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemEntry {
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub order: i32,
    /// Role names that see this item.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub children: Vec<ItemEntry>,
}

impl NavigationManifest {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(format!("invalid navigation manifest: {e}")))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&source)
    }

    fn items(&self) -> impl Iterator<Item = &ItemEntry> {
        self.groups
            .iter()
            .flat_map(|g| g.items.iter())
            .flat_map(|item| std::iter::once(item).chain(item.children.iter()))
    }

    fn check_depth(&self) -> Result<()> {
        let too_deep = self
            .groups
            .iter()
            .flat_map(|g| g.items.iter())
            .flat_map(|item| item.children.iter())
            .find(|child| !child.children.is_empty());

        match too_deep {
            Some(child) => Err(Error::Validation(format!(
                "'{}' has children but navigation items nest only one level deep",
                child.label
            ))),
            None => Ok(()),
        }
    }

    /// Runs every field check the upserts would run, so a bad entry late in
    /// the manifest fails before the first write.
    fn check_fields(&self) -> Result<()> {
        for entry in &self.roles {
            role_input(entry).validate()?;
        }
        for entry in &self.groups {
            group_input(entry).validate()?;
        }
        for entry in self.items() {
            item_input(entry, None, None).validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub groups: usize,
    pub items: usize,
    pub assignments_added: usize,
}

/// Applies a manifest. Depth, field values and role references are all
/// checked before anything is written, so a rejected manifest leaves the
/// store untouched.
pub fn seed(admin: &NavigationAdmin, manifest: &NavigationManifest) -> Result<SeedReport> {
    manifest.check_depth()?;
    manifest.check_fields()?;

    let declared: BTreeSet<&str> = manifest.roles.iter().map(|r| r.name.as_str()).collect();
    for name in manifest.items().flat_map(|item| item.roles.iter()) {
        if !declared.contains(name.as_str()) && admin.role_by_name(name)?.is_none() {
            return Err(Error::Validation(format!("unknown role '{name}'")));
        }
    }

    let mut report = SeedReport::default();
    let mut role_ids: HashMap<String, String> = HashMap::new();

    for entry in &manifest.roles {
        let role = admin.upsert_role(role_input(entry))?;
        role_ids.insert(role.name, role.id);
        report.roles += 1;
    }

    for entry in &manifest.groups {
        let group = admin.upsert_group(group_input(entry))?;
        report.groups += 1;

        for item_entry in &entry.items {
            let item = admin.upsert_item(item_input(item_entry, Some(group.id.clone()), None))?;
            report.items += 1;
            report.assignments_added += assign(admin, &mut role_ids, &item_entry.roles, &item.id)?;

            for child_entry in &item_entry.children {
                let child = admin.upsert_item(item_input(child_entry, None, Some(item.id.clone())))?;
                report.items += 1;
                report.assignments_added +=
                    assign(admin, &mut role_ids, &child_entry.roles, &child.id)?;
            }
        }
    }

    tracing::info!(
        roles = report.roles,
        groups = report.groups,
        items = report.items,
        assignments_added = report.assignments_added,
        "navigation manifest applied"
    );
    Ok(report)
}

fn role_input(entry: &RoleEntry) -> RoleInput {
    RoleInput {
        name: entry.name.clone(),
        is_system: entry.is_system,
    }
}

fn group_input(entry: &GroupEntry) -> GroupInput {
    GroupInput {
        name: entry.name.clone(),
        description: entry.description.clone(),
        order: entry.order,
        is_active: entry.active,
    }
}

fn item_input(entry: &ItemEntry, group_id: Option<String>, parent_id: Option<String>) -> ItemInput {
    ItemInput {
        label: entry.label.clone(),
        icon: entry.icon.clone(),
        url: entry.url.clone(),
        order: entry.order,
        group_id,
        parent_id,
    }
}

fn assign(
    admin: &NavigationAdmin,
    role_ids: &mut HashMap<String, String>,
    roles: &[String],
    item_id: &str,
) -> Result<usize> {
    let mut added = 0;
    for name in roles {
        let role_id = match role_ids.get(name) {
            Some(id) => id.clone(),
            None => {
                let role = admin.role_by_name(name)?.ok_or(Error::NotFound("role"))?;
                role_ids.insert(role.name, role.id.clone());
                role.id
            }
        };
        if admin.upsert_assignment(&role_id, item_id)? {
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::navigation::NavigationAuthorizer;
    use crate::store::{SqliteStore, Store};
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[[roles]]
name = "Super Admin"
is_system = true

[[roles]]
name = "Teller"

[[groups]]
name = "Administration"
order = 1

[[groups.items]]
label = "Settings"
url = "/settings"
order = 2
roles = ["Super Admin"]

[[groups.items]]
label = "Staff"
url = "/staff"
icon = "users"
order = 1
roles = ["Super Admin"]

[[groups.items.children]]
label = "Staff Roles"
url = "/staff/roles"
order = 1
roles = ["Super Admin"]

[[groups]]
name = "Savings"
order = 0

[[groups.items]]
label = "Deposits"
url = "/savings/deposits"
roles = ["Super Admin", "Teller"]
"#;

    fn setup() -> (TempDir, Arc<dyn Store>, NavigationAdmin) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        let admin = NavigationAdmin::new(store.clone());
        (temp, store, admin)
    }

    #[test]
    fn test_seed_builds_navigation() {
        let (_temp, store, admin) = setup();
        let manifest = NavigationManifest::from_toml(MANIFEST).unwrap();

        let report = seed(&admin, &manifest).unwrap();
        assert_eq!(
            report,
            SeedReport {
                roles: 2,
                groups: 2,
                items: 4,
                assignments_added: 5,
            }
        );

        let super_admin = admin.role_by_name("Super Admin").unwrap().unwrap();
        assert!(super_admin.is_system);

        let tree = NavigationAuthorizer::new(store)
            .tree_for_role(&super_admin.id)
            .unwrap();
        let groups: Vec<&str> = tree.iter().map(|s| s.group.name.as_str()).collect();
        assert_eq!(groups, vec!["Savings", "Administration"]);
        assert_eq!(tree[1].items[0].label, "Staff");
        assert_eq!(tree[1].items[0].children[0].label, "Staff Roles");
    }

    #[test]
    fn test_reseeding_updates_in_place() {
        let (_temp, store, admin) = setup();
        seed(&admin, &NavigationManifest::from_toml(MANIFEST).unwrap()).unwrap();

        let changed = MANIFEST.replace("order = 2", "order = 9");
        let report = seed(&admin, &NavigationManifest::from_toml(&changed).unwrap()).unwrap();

        assert_eq!(report.assignments_added, 0);
        assert_eq!(store.list_items().unwrap().len(), 4);
        assert_eq!(store.list_groups().unwrap().len(), 2);
        assert_eq!(store.list_roles().unwrap().len(), 2);

        let settings = store
            .list_items()
            .unwrap()
            .into_iter()
            .find(|i| i.label == "Settings")
            .unwrap();
        assert_eq!(settings.order, 9);
    }

    #[test]
    fn test_demo_manifest_applies() {
        let (_temp, store, admin) = setup();
        let manifest =
            NavigationManifest::from_toml(include_str!("../../demos/navigation.toml")).unwrap();
        seed(&admin, &manifest).unwrap();

        let teller = admin.role_by_name("Teller").unwrap().unwrap();
        let tree = NavigationAuthorizer::new(store)
            .tree_for_role(&teller.id)
            .unwrap();
        let groups: Vec<&str> = tree.iter().map(|s| s.group.name.as_str()).collect();
        assert_eq!(groups, vec!["Members", "Savings"]);
    }

    #[test]
    fn test_bad_field_late_in_manifest_writes_nothing() {
        let (_temp, store, admin) = setup();
        let manifest = NavigationManifest::from_toml(
            r#"
[[roles]]
name = "Teller"

[[groups]]
name = "Savings"

[[groups.items]]
label = "Deposits"
url = "/savings/deposits"
roles = ["Teller"]

[[groups]]
name = "Loans"

[[groups.items]]
label = "Accounts"
url = "not a url"
"#,
        )
        .unwrap();

        assert!(matches!(seed(&admin, &manifest), Err(Error::Validation(_))));
        assert!(store.list_roles().unwrap().is_empty());
        assert!(store.list_groups().unwrap().is_empty());
        assert!(store.list_items().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_role_writes_nothing() {
        let (_temp, store, admin) = setup();
        let manifest = NavigationManifest::from_toml(
            r#"
[[groups]]
name = "Loans"

[[groups.items]]
label = "Accounts"
roles = ["Ghost"]
"#,
        )
        .unwrap();

        assert!(matches!(seed(&admin, &manifest), Err(Error::Validation(_))));
        assert!(store.list_groups().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_grandchildren_and_unknown_fields() {
        let (_temp, _store, admin) = setup();
        let manifest = NavigationManifest::from_toml(
            r#"
[[groups]]
name = "Loans"

[[groups.items]]
label = "Accounts"

[[groups.items.children]]
label = "Disburse"

[[groups.items.children.children]]
label = "Too deep"
"#,
        )
        .unwrap();
        assert!(matches!(seed(&admin, &manifest), Err(Error::Validation(_))));

        let typo = NavigationManifest::from_toml("[[groups]]\nnmae = \"Loans\"\n");
        assert!(matches!(typo, Err(Error::Config(_))));
    }
}
