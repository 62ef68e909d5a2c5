pub const SCHEMA: &str = r#"
-- Top-level menu sections
CREATE TABLE IF NOT EXISTS navigation_groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Menu entries; at most one of group_id / parent_id is set.
-- Children inherit the group of their parent.
CREATE TABLE IF NOT EXISTS navigation_items (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    icon TEXT,
    url TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    group_id TEXT REFERENCES navigation_groups(id) ON DELETE RESTRICT,
    parent_id TEXT REFERENCES navigation_items(id) ON DELETE RESTRICT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    CHECK (group_id IS NULL OR parent_id IS NULL),
    CHECK (parent_id IS NULL OR parent_id <> id)
);

-- Authorization identities; rows mirror the external auth module
CREATE TABLE IF NOT EXISTS roles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    is_system INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Which items a role may see
CREATE TABLE IF NOT EXISTS role_navigation (
    role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    navigation_item_id TEXT NOT NULL REFERENCES navigation_items(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (role_id, navigation_item_id)
);

-- API credentials; non-admin tokens are bound to a role
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- lookup segment of the raw token
    is_admin INTEGER NOT NULL DEFAULT 0,
    role_id TEXT REFERENCES roles(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                   -- NULL = never
    last_used_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_group ON navigation_items(group_id);
CREATE INDEX IF NOT EXISTS idx_items_parent ON navigation_items(parent_id);
CREATE INDEX IF NOT EXISTS idx_role_navigation_item ON role_navigation(navigation_item_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_role ON tokens(role_id);
"#;
