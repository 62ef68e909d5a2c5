use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, ffi, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const GROUP_COLUMNS: &str =
    "id, name, description, sort_order, is_active, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, label, icon, url, sort_order, group_id, parent_id, created_at, updated_at";
const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, role_id, created_at, expires_at, last_used_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// UNIQUE or PRIMARY KEY only; foreign key and CHECK failures are not duplicates.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<NavigationGroup> {
    Ok(NavigationGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        order: row.get(3)?,
        is_active: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<NavigationItem> {
    Ok(NavigationItem {
        id: row.get(0)?,
        label: row.get(1)?,
        icon: row.get(2)?,
        url: row.get(3)?,
        order: row.get(4)?,
        placement: Placement::from_columns(row.get(5)?, row.get(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
        is_system: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        role_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

fn load_group(conn: &Connection, id: &str) -> Result<Option<NavigationGroup>> {
    conn.query_row(
        &format!("SELECT {GROUP_COLUMNS} FROM navigation_groups WHERE id = ?1"),
        params![id],
        group_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn load_item(conn: &Connection, id: &str) -> Result<Option<NavigationItem>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM navigation_items WHERE id = ?1"),
        params![id],
        item_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn role_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM roles WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn item_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM navigation_items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn load_assignments(conn: &Connection, role_id: &str) -> Result<Vec<RoleNavigation>> {
    let mut stmt = conn.prepare(
        "SELECT role_id, navigation_item_id, created_at
         FROM role_navigation WHERE role_id = ?1 ORDER BY navigation_item_id",
    )?;

    let rows = stmt.query_map(params![role_id], |row| {
        Ok(RoleNavigation {
            role_id: row.get(0)?,
            navigation_item_id: row.get(1)?,
            created_at: parse_datetime(&row.get::<_, String>(2)?),
        })
    })?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn child_ids(conn: &Connection, parent_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM navigation_items WHERE parent_id = ?1")?;
    let rows = stmt.query_map(params![parent_id], |row| row.get(0))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Checks the references an item's placement makes and the one-level nesting bound.
fn check_placement(conn: &Connection, item: &NavigationItem, is_update: bool) -> Result<()> {
    match &item.placement {
        Placement::TopLevel { group_id: None } => Ok(()),
        Placement::TopLevel {
            group_id: Some(group_id),
        } => {
            if load_group(conn, group_id)?.is_none() {
                return Err(Error::NotFound("navigation group"));
            }
            Ok(())
        }
        Placement::Child { parent_id } => {
            if parent_id == &item.id {
                return Err(Error::Validation(
                    "navigation item cannot be its own parent".to_string(),
                ));
            }
            let parent = load_item(conn, parent_id)?.ok_or(Error::NotFound("parent navigation item"))?;
            if matches!(parent.placement, Placement::Child { .. }) {
                return Err(Error::Validation(
                    "navigation items can only be nested one level deep".to_string(),
                ));
            }
            if is_update && !child_ids(conn, &item.id)?.is_empty() {
                return Err(Error::Validation(
                    "navigation item with children cannot become a child".to_string(),
                ));
            }
            Ok(())
        }
    }
}

fn insert_item(conn: &Connection, item: &NavigationItem) -> Result<()> {
    conn.execute(
        "INSERT INTO navigation_items (id, label, icon, url, sort_order, group_id, parent_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            item.id,
            item.label,
            item.icon,
            item.url,
            item.order,
            item.placement.group_id(),
            item.placement.parent_id(),
            format_datetime(&item.created_at),
            format_datetime(&item.updated_at),
        ],
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Group operations

    fn create_group(&self, group: &NavigationGroup) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO navigation_groups (id, name, description, sort_order, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                group.id,
                group.name,
                group.description,
                group.order,
                group.is_active,
                format_datetime(&group.created_at),
                format_datetime(&group.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::DuplicateName(group.name.clone())),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_group(&self, id: &str) -> Result<Option<NavigationGroup>> {
        load_group(&self.conn(), id)
    }

    fn list_groups(&self) -> Result<Vec<NavigationGroup>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM navigation_groups ORDER BY sort_order, name"
        ))?;

        let rows = stmt.query_map([], group_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_group(&self, group: &NavigationGroup) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE navigation_groups
             SET name = ?1, description = ?2, sort_order = ?3, is_active = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                group.name,
                group.description,
                group.order,
                group.is_active,
                format_datetime(&group.updated_at),
                group.id,
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound("navigation group")),
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::DuplicateName(group.name.clone())),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_group(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let items: i64 = tx.query_row(
            "SELECT COUNT(*) FROM navigation_items WHERE group_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if items > 0 {
            return Err(Error::Conflict(format!(
                "navigation group still contains {items} item(s)"
            )));
        }

        let rows = tx.execute("DELETE FROM navigation_groups WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    fn upsert_group(&self, group: &NavigationGroup) -> Result<NavigationGroup> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO navigation_groups (id, name, description, sort_order, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (name) DO UPDATE SET
                description = excluded.description,
                sort_order = excluded.sort_order,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at",
            params![
                group.id,
                group.name,
                group.description,
                group.order,
                group.is_active,
                format_datetime(&group.created_at),
                format_datetime(&group.updated_at),
            ],
        )?;

        conn.query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM navigation_groups WHERE name = ?1"),
            params![group.name],
            group_from_row,
        )
        .map_err(Error::from)
    }

    // Item operations

    fn create_item(&self, item: &NavigationItem) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        check_placement(&tx, item, false)?;
        insert_item(&tx, item)?;
        tx.commit()?;
        Ok(())
    }

    fn get_item(&self, id: &str) -> Result<Option<NavigationItem>> {
        load_item(&self.conn(), id)
    }

    fn list_items(&self) -> Result<Vec<NavigationItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM navigation_items ORDER BY sort_order, label, id"
        ))?;

        let rows = stmt.query_map([], item_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_item(&self, item: &NavigationItem) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !item_exists(&tx, &item.id)? {
            return Err(Error::NotFound("navigation item"));
        }
        check_placement(&tx, item, true)?;

        tx.execute(
            "UPDATE navigation_items
             SET label = ?1, icon = ?2, url = ?3, sort_order = ?4, group_id = ?5, parent_id = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                item.label,
                item.icon,
                item.url,
                item.order,
                item.placement.group_id(),
                item.placement.parent_id(),
                format_datetime(&item.updated_at),
                item.id,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_item(&self, id: &str, cascade_children: bool) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !item_exists(&tx, id)? {
            return Ok(false);
        }

        let children = child_ids(&tx, id)?;
        if !children.is_empty() && !cascade_children {
            return Err(Error::Conflict(format!(
                "navigation item has {} child item(s)",
                children.len()
            )));
        }

        // role_navigation rows go with their items via ON DELETE CASCADE
        for child in &children {
            tx.execute("DELETE FROM navigation_items WHERE id = ?1", params![child])?;
        }
        tx.execute("DELETE FROM navigation_items WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(true)
    }

    fn upsert_item(&self, item: &NavigationItem) -> Result<NavigationItem> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        check_placement(&tx, item, false)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM navigation_items
                 WHERE label = ?1 AND group_id IS ?2 AND parent_id IS ?3",
                params![
                    item.label,
                    item.placement.group_id(),
                    item.placement.parent_id()
                ],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE navigation_items SET icon = ?1, url = ?2, sort_order = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![
                        item.icon,
                        item.url,
                        item.order,
                        format_datetime(&item.updated_at),
                        id
                    ],
                )?;
                id
            }
            None => {
                insert_item(&tx, item)?;
                item.id.clone()
            }
        };

        let stored = load_item(&tx, &id)?.ok_or(Error::NotFound("navigation item"))?;
        tx.commit()?;
        Ok(stored)
    }

    // Role operations

    fn create_role(&self, role: &Role) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO roles (id, name, is_system, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                role.id,
                role.name,
                role.is_system,
                format_datetime(&role.created_at)
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::DuplicateName(role.name.clone())),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_role(&self, id: &str) -> Result<Option<Role>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, is_system, created_at FROM roles WHERE id = ?1",
            params![id],
            role_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, is_system, created_at FROM roles WHERE name = ?1",
            params![name],
            role_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_roles(&self) -> Result<Vec<Role>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, is_system, created_at FROM roles ORDER BY name")?;

        let rows = stmt.query_map([], role_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_role(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let is_system: Option<bool> = tx
            .query_row(
                "SELECT is_system FROM roles WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match is_system {
            None => Ok(false),
            Some(true) => Err(Error::Conflict("system roles cannot be deleted".to_string())),
            Some(false) => {
                tx.execute("DELETE FROM roles WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(true)
            }
        }
    }

    fn upsert_role(&self, role: &Role) -> Result<Role> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO roles (id, name, is_system, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (name) DO UPDATE SET is_system = excluded.is_system",
            params![
                role.id,
                role.name,
                role.is_system,
                format_datetime(&role.created_at)
            ],
        )?;

        conn.query_row(
            "SELECT id, name, is_system, created_at FROM roles WHERE name = ?1",
            params![role.name],
            role_from_row,
        )
        .map_err(Error::from)
    }

    // Role-navigation M2M operations

    fn upsert_assignment(&self, role_id: &str, item_id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !role_exists(&tx, role_id)? {
            return Err(Error::NotFound("role"));
        }
        if !item_exists(&tx, item_id)? {
            return Err(Error::NotFound("navigation item"));
        }

        let rows = tx.execute(
            "INSERT INTO role_navigation (role_id, navigation_item_id, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (role_id, navigation_item_id) DO NOTHING",
            params![role_id, item_id, format_datetime(&Utc::now())],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    fn remove_assignment(&self, role_id: &str, item_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM role_navigation WHERE role_id = ?1 AND navigation_item_id = ?2",
            params![role_id, item_id],
        )?;
        Ok(rows > 0)
    }

    fn replace_assignments(
        &self,
        role_id: &str,
        item_ids: &[String],
    ) -> Result<Vec<RoleNavigation>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !role_exists(&tx, role_id)? {
            return Err(Error::NotFound("role"));
        }

        let wanted: BTreeSet<&str> = item_ids.iter().map(String::as_str).collect();
        for item_id in &wanted {
            if !item_exists(&tx, item_id)? {
                return Err(Error::NotFound("navigation item"));
            }
        }

        tx.execute(
            "DELETE FROM role_navigation WHERE role_id = ?1",
            params![role_id],
        )?;

        let now = format_datetime(&Utc::now());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO role_navigation (role_id, navigation_item_id, created_at)
                 VALUES (?1, ?2, ?3)",
            )?;
            for item_id in &wanted {
                stmt.execute(params![role_id, item_id, now])?;
            }
        }

        let committed = load_assignments(&tx, role_id)?;
        tx.commit()?;
        Ok(committed)
    }

    fn list_role_assignments(&self, role_id: &str) -> Result<Vec<RoleNavigation>> {
        load_assignments(&self.conn(), role_id)
    }

    fn list_items_for_role(&self, role_id: &str) -> Result<Vec<AssignedItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT i.id, i.label, i.icon, i.url, i.sort_order, i.group_id, i.parent_id,
                    i.created_at, i.updated_at,
                    g.id, g.name, g.sort_order, g.is_active
             FROM role_navigation rn
             JOIN navigation_items i ON i.id = rn.navigation_item_id
             LEFT JOIN navigation_items p ON p.id = i.parent_id
             LEFT JOIN navigation_groups g ON g.id = COALESCE(i.group_id, p.group_id)
             WHERE rn.role_id = ?1
             ORDER BY i.sort_order, i.label, i.id",
        )?;

        let rows = stmt.query_map(params![role_id], |row| {
            let item = item_from_row(row)?;
            let group = match row.get::<_, Option<String>>(9)? {
                Some(id) => Some(GroupSummary {
                    id,
                    name: row.get(10)?,
                    order: row.get(11)?,
                    is_active: row.get(12)?,
                }),
                None => None,
            };
            Ok((item, group))
        })?;
        let assigned = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        // Rows arrive sorted, so each child list inherits (order, label) ordering.
        let mut children_of: HashMap<String, Vec<NavigationItem>> = HashMap::new();
        for (item, _) in &assigned {
            if let Placement::Child { parent_id } = &item.placement {
                children_of
                    .entry(parent_id.clone())
                    .or_default()
                    .push(item.clone());
            }
        }

        Ok(assigned
            .into_iter()
            .map(|(item, group)| {
                let children = children_of.remove(&item.id).unwrap_or_default();
                AssignedItem {
                    item,
                    group,
                    children,
                }
            })
            .collect())
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, role_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.role_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
            params![id],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens ORDER BY created_at DESC, id"
        ))?;

        let rows = stmt.query_map([], token_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_role_tokens(&self, role_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE role_id = ?1 ORDER BY created_at DESC, id"
        ))?;

        let rows = stmt.query_map(params![role_id], token_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn group(id: &str, name: &str, order: i32, is_active: bool) -> NavigationGroup {
        NavigationGroup {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            order,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn top_level(id: &str, label: &str, order: i32, group_id: Option<&str>) -> NavigationItem {
        NavigationItem {
            id: id.to_string(),
            label: label.to_string(),
            icon: None,
            url: Some(format!("/{}", label.to_lowercase())),
            order,
            placement: Placement::TopLevel {
                group_id: group_id.map(str::to_string),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn child(id: &str, label: &str, order: i32, parent_id: &str) -> NavigationItem {
        NavigationItem {
            placement: Placement::Child {
                parent_id: parent_id.to_string(),
            },
            ..top_level(id, label, order, None)
        }
    }

    fn role(id: &str, name: &str, is_system: bool) -> Role {
        Role {
            id: id.to_string(),
            name: name.to_string(),
            is_system,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = open_store();
        store.initialize().unwrap();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "navigation_groups",
            "navigation_items",
            "roles",
            "role_navigation",
            "tokens",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_group_crud_and_duplicate_name() {
        let (_temp, store) = open_store();

        store.create_group(&group("g-1", "Administration", 1, true)).unwrap();
        let dup = store.create_group(&group("g-2", "Administration", 2, true));
        assert!(matches!(dup, Err(Error::DuplicateName(name)) if name == "Administration"));

        store.create_group(&group("g-2", "Loans", 0, true)).unwrap();
        let names: Vec<String> = store.list_groups().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Loans", "Administration"]);

        let mut renamed = store.get_group("g-2").unwrap().unwrap();
        renamed.name = "Administration".to_string();
        assert!(matches!(store.update_group(&renamed), Err(Error::DuplicateName(_))));

        assert!(store.delete_group("g-2").unwrap());
        assert!(store.get_group("g-2").unwrap().is_none());
        assert!(!store.delete_group("g-2").unwrap());
    }

    #[test]
    fn test_delete_group_with_items_conflicts() {
        let (_temp, store) = open_store();
        store.create_group(&group("g-1", "Administration", 1, true)).unwrap();
        store.create_item(&top_level("i-1", "Staff", 1, Some("g-1"))).unwrap();

        assert!(matches!(store.delete_group("g-1"), Err(Error::Conflict(_))));
        assert!(store.get_group("g-1").unwrap().is_some());

        store.delete_item("i-1", false).unwrap();
        assert!(store.delete_group("g-1").unwrap());
    }

    #[test]
    fn test_create_item_checks_references() {
        let (_temp, store) = open_store();

        let missing_group = store.create_item(&top_level("i-1", "Staff", 1, Some("nope")));
        assert!(matches!(missing_group, Err(Error::NotFound("navigation group"))));

        let missing_parent = store.create_item(&child("i-2", "Roles", 1, "nope"));
        assert!(matches!(missing_parent, Err(Error::NotFound("parent navigation item"))));

        assert!(store.list_items().unwrap().is_empty());
    }

    #[test]
    fn test_nesting_is_bounded_to_one_level() {
        let (_temp, store) = open_store();
        store.create_group(&group("g-1", "Administration", 1, true)).unwrap();
        store.create_item(&top_level("i-1", "Staff", 1, Some("g-1"))).unwrap();
        store.create_item(&child("i-2", "Staff Roles", 1, "i-1")).unwrap();

        let grandchild = store.create_item(&child("i-3", "Deep", 1, "i-2"));
        assert!(matches!(grandchild, Err(Error::Validation(_))));

        // an item cannot point at itself
        let mut own_parent = store.get_item("i-1").unwrap().unwrap();
        own_parent.placement = Placement::Child {
            parent_id: "i-1".to_string(),
        };
        assert!(matches!(store.update_item(&own_parent), Err(Error::Validation(_))));

        // a parent cannot be pushed under another item
        store.create_item(&top_level("i-4", "Settings", 2, Some("g-1"))).unwrap();
        let mut demoted = store.get_item("i-1").unwrap().unwrap();
        demoted.placement = Placement::Child {
            parent_id: "i-4".to_string(),
        };
        assert!(matches!(store.update_item(&demoted), Err(Error::Validation(_))));
    }

    #[test]
    fn test_delete_item_with_children() {
        let (_temp, store) = open_store();
        store.create_role(&role("r-1", "Super Admin", true)).unwrap();
        store.create_item(&top_level("i-1", "Staff", 1, None)).unwrap();
        store.create_item(&child("i-2", "Staff Roles", 1, "i-1")).unwrap();
        store.upsert_assignment("r-1", "i-1").unwrap();
        store.upsert_assignment("r-1", "i-2").unwrap();

        assert!(matches!(store.delete_item("i-1", false), Err(Error::Conflict(_))));
        assert_eq!(store.list_role_assignments("r-1").unwrap().len(), 2);

        assert!(store.delete_item("i-1", true).unwrap());
        assert!(store.get_item("i-1").unwrap().is_none());
        assert!(store.get_item("i-2").unwrap().is_none());
        assert_eq!(store.list_role_assignments("r-1").unwrap().len(), 0);

        assert!(!store.delete_item("i-1", true).unwrap());
    }

    #[test]
    fn test_upsert_assignment_is_idempotent() {
        let (_temp, store) = open_store();
        store.create_role(&role("r-1", "Super Admin", true)).unwrap();
        store.create_item(&top_level("i-1", "Staff", 1, None)).unwrap();

        assert!(store.upsert_assignment("r-1", "i-1").unwrap());
        assert!(!store.upsert_assignment("r-1", "i-1").unwrap());
        assert_eq!(store.list_role_assignments("r-1").unwrap().len(), 1);

        assert!(matches!(
            store.upsert_assignment("r-1", "missing"),
            Err(Error::NotFound("navigation item"))
        ));
        assert!(matches!(
            store.upsert_assignment("missing", "i-1"),
            Err(Error::NotFound("role"))
        ));
    }

    #[test]
    fn test_replace_assignments_is_all_or_nothing() {
        let (_temp, store) = open_store();
        store.create_role(&role("r-1", "Cashier", false)).unwrap();
        store.create_item(&top_level("i-1", "Deposits", 1, None)).unwrap();
        store.create_item(&top_level("i-2", "Withdrawals", 2, None)).unwrap();
        store.upsert_assignment("r-1", "i-1").unwrap();

        let ids = vec!["i-2".to_string(), "missing".to_string()];
        assert!(matches!(
            store.replace_assignments("r-1", &ids),
            Err(Error::NotFound("navigation item"))
        ));
        let kept: Vec<String> = store
            .list_role_assignments("r-1")
            .unwrap()
            .into_iter()
            .map(|a| a.navigation_item_id)
            .collect();
        assert_eq!(kept, vec!["i-1"]);

        let ids = vec!["i-2".to_string(), "i-2".to_string()];
        let committed = store.replace_assignments("r-1", &ids).unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].navigation_item_id, "i-2");
        let kept: Vec<String> = store
            .list_role_assignments("r-1")
            .unwrap()
            .into_iter()
            .map(|a| a.navigation_item_id)
            .collect();
        assert_eq!(kept, vec!["i-2"]);

        assert!(store.replace_assignments("r-1", &[]).unwrap().is_empty());
        assert_eq!(store.list_role_assignments("r-1").unwrap().len(), 0);
    }

    #[test]
    fn test_list_items_for_role_annotates_groups_and_children() {
        let (_temp, store) = open_store();
        store.create_role(&role("r-1", "Manager", false)).unwrap();
        store.create_group(&group("g-1", "Loans", 2, true)).unwrap();
        store.create_item(&top_level("i-1", "Loan Accounts", 1, Some("g-1"))).unwrap();
        store.create_item(&child("i-2", "Disburse", 2, "i-1")).unwrap();
        store.create_item(&child("i-3", "Approve", 1, "i-1")).unwrap();
        store.create_item(&child("i-4", "Write Off", 3, "i-1")).unwrap();
        for item in ["i-1", "i-2", "i-3"] {
            store.upsert_assignment("r-1", item).unwrap();
        }

        let assigned = store.list_items_for_role("r-1").unwrap();
        assert_eq!(assigned.len(), 3);

        let parent = assigned.iter().find(|a| a.item.id == "i-1").unwrap();
        let children: Vec<&str> = parent.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(children, vec!["Approve", "Disburse"]);
        assert_eq!(parent.group.as_ref().unwrap().name, "Loans");

        let nested = assigned.iter().find(|a| a.item.id == "i-2").unwrap();
        let inherited = nested.group.as_ref().unwrap();
        assert_eq!(inherited.id, "g-1");
        assert_eq!(inherited.order, 2);
        assert!(nested.children.is_empty());

        assert!(store.list_items_for_role("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_upserts_update_in_place() {
        let (_temp, store) = open_store();

        let first = store.upsert_group(&group("g-1", "Administration", 1, true)).unwrap();
        let mut changed = group("g-other", "Administration", 5, false);
        changed.description = Some("Back office".to_string());
        let second = store.upsert_group(&changed).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.order, 5);
        assert!(!second.is_active);
        assert_eq!(store.list_groups().unwrap().len(), 1);

        let item = store.upsert_item(&top_level("i-1", "Staff", 1, Some("g-1"))).unwrap();
        let mut moved = top_level("i-other", "Staff", 7, Some("g-1"));
        moved.icon = Some("users".to_string());
        let again = store.upsert_item(&moved).unwrap();
        assert_eq!(again.id, item.id);
        assert_eq!(again.order, 7);
        assert_eq!(again.icon.as_deref(), Some("users"));

        // same label elsewhere is a different item
        store.upsert_item(&top_level("i-2", "Staff", 1, None)).unwrap();
        assert_eq!(store.list_items().unwrap().len(), 2);

        let admin = store.upsert_role(&role("r-1", "Super Admin", false)).unwrap();
        let admin_again = store.upsert_role(&role("r-2", "Super Admin", true)).unwrap();
        assert_eq!(admin_again.id, admin.id);
        assert!(admin_again.is_system);
    }

    #[test]
    fn test_system_roles_cannot_be_deleted() {
        let (_temp, store) = open_store();
        store.create_role(&role("r-1", "Super Admin", true)).unwrap();
        store.create_role(&role("r-2", "Teller", false)).unwrap();
        assert!(matches!(
            store.create_role(&role("r-3", "Teller", false)),
            Err(Error::DuplicateName(_))
        ));

        assert!(matches!(store.delete_role("r-1"), Err(Error::Conflict(_))));
        assert!(store.delete_role("r-2").unwrap());
        assert!(!store.delete_role("r-2").unwrap());
    }

    #[test]
    fn test_token_lookup_collision() {
        let (_temp, store) = open_store();

        let token = |id: &str| Token {
            id: id.to_string(),
            token_hash: "hash".to_string(),
            token_lookup: "lookup12".to_string(),
            is_admin: true,
            role_id: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };

        store.create_token(&token("token-1")).unwrap();
        assert!(store.has_admin_token().unwrap());

        let result = store.create_token(&token("token-2"));
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
    }

    #[test]
    fn test_foreign_key_failure_is_not_a_collision() {
        let (_temp, store) = open_store();

        let orphan = Token {
            id: "token-1".to_string(),
            token_hash: "hash".to_string(),
            token_lookup: "lookup12".to_string(),
            is_admin: false,
            role_id: Some("deleted-role".to_string()),
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };
        assert!(matches!(store.create_token(&orphan), Err(Error::Database(_))));

        // parent_id = id trips the CHECK constraint, not the UNIQUE one
        store.create_role(&role("r-1", "Teller", false)).unwrap();
        let conn = store.conn();
        let err = conn
            .execute(
                "INSERT INTO navigation_items (id, label, sort_order, parent_id) VALUES ('x', 'X', 0, 'x')",
                [],
            )
            .unwrap_err();
        assert!(!is_unique_violation(&err));

        let err = conn
            .execute(
                "INSERT INTO roles (id, name, is_system) VALUES ('r-2', 'Teller', 0)",
                [],
            )
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
