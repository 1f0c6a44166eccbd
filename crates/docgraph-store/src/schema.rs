//! Graph database schema SQL.
//!
//! `seq` preserves insertion order; `id` is the public uuid. Properties are
//! stored as flat JSON objects, `name` holds the derived display name and
//! `name_lower` its Unicode lowercase form, so name lookups stay in SQL.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS graph_nodes (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    label TEXT NOT NULL,
    name TEXT NOT NULL,
    name_lower TEXT NOT NULL,
    owner INTEGER NOT NULL,
    properties_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_graph_nodes_owner ON graph_nodes(owner);
CREATE INDEX IF NOT EXISTS idx_graph_nodes_label ON graph_nodes(owner, label);

CREATE TABLE IF NOT EXISTS graph_relationships (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    source_id TEXT NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
    rel_type TEXT NOT NULL,
    owner INTEGER NOT NULL,
    properties_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_graph_rel_owner ON graph_relationships(owner);
CREATE INDEX IF NOT EXISTS idx_graph_rel_source ON graph_relationships(source_id);
CREATE INDEX IF NOT EXISTS idx_graph_rel_target ON graph_relationships(target_id);
"#;

/// Node columns in the order `row_to_node` reads them.
pub const NODE_COLUMNS: &str = "id, label, owner, properties_json, created_at";
/// Number of columns in [`NODE_COLUMNS`].
pub const NODE_WIDTH: usize = 5;

/// Relationship columns in the order `row_to_relationship` reads them.
pub const REL_COLUMNS: &str =
    "id, source_id, target_id, rel_type, owner, properties_json, created_at";
/// Number of columns in [`REL_COLUMNS`].
pub const REL_WIDTH: usize = 7;

/// Prefix every column of a column list with a table alias.
pub fn aliased(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
