//! External graph backend on a SQLite database file.
//!
//! Every logical operation opens its own connection (one session per
//! request, never shared across calls) and relationship creation runs inside
//! a transaction so the endpoint check and the insert are atomic. Node ids
//! are uuids stored as an explicit column; the row's `seq` only orders.

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use docgraph_core::{Error, Result};

use crate::graph::{normalize_terms, now_millis, rel, GraphStore};
use crate::schema::{aliased, NODE_COLUMNS, NODE_WIDTH, REL_COLUMNS, REL_WIDTH, SCHEMA_SQL};
use crate::types::*;

/// SQLite-backed graph store.
#[derive(Debug)]
pub struct SqliteGraphStore {
    db_path: PathBuf,
}

impl SqliteGraphStore {
    /// Open or create the graph database at `db_path`.
    ///
    /// Fails with `Error::StoreUnavailable` when the file cannot be created,
    /// the schema cannot be applied, or the connectivity check fails.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StoreUnavailable(format!("{}: {}", parent.display(), e))
            })?;
        }

        let store = Self { db_path };
        let conn = store
            .session()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::StoreUnavailable(format!("Schema init failed: {}", e)))?;
        drop(conn);
        store
            .verify_connectivity()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        let (nodes, relationships) = store.count_all()?;
        info!(
            "SqliteGraphStore initialized: {} nodes, {} relationships, path={}",
            nodes,
            relationships,
            store.db_path.display()
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh connection for one logical operation.
    fn session(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    fn count_all(&self) -> Result<(i64, i64)> {
        let conn = self.session()?;
        let nodes: i64 = conn
            .query_row("SELECT COUNT(*) FROM graph_nodes", [], |row| row.get(0))
            .map_err(db_err)?;
        let relationships: i64 = conn
            .query_row("SELECT COUNT(*) FROM graph_relationships", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok((nodes, relationships))
    }

    fn type_counts(conn: &Connection, sql: &str, owner: OwnerId) -> Result<Vec<(String, usize)>> {
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![owner.0], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|(k, n)| (k, usize::try_from(n).unwrap_or(0)))
            .collect())
    }

    fn name_contains(
        conn: &Connection,
        owner: OwnerId,
        terms: &[String],
        limit: usize,
    ) -> Result<Subgraph> {
        let terms = normalize_terms(terms);
        let mut sub = Subgraph::new();
        if terms.is_empty() || limit == 0 {
            return Ok(sub);
        }

        let conditions = (0..terms.len())
            .map(|i| format!("instr(e.name_lower, ?{}) > 0", i + 2))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT {e}, {r}, {m} FROM graph_nodes e
             LEFT JOIN graph_relationships r
                ON (r.source_id = e.id OR r.target_id = e.id) AND r.owner = e.owner
             LEFT JOIN graph_nodes m
                ON m.id = CASE WHEN r.source_id = e.id THEN r.target_id ELSE r.source_id END
                AND m.owner = e.owner
             WHERE e.owner = ?1 AND ({conditions})
             ORDER BY e.seq, r.seq
             LIMIT ?{limit_param}",
            e = aliased(NODE_COLUMNS, "e"),
            r = aliased(REL_COLUMNS, "r"),
            m = aliased(NODE_COLUMNS, "m"),
            conditions = conditions,
            limit_param = terms.len() + 2,
        );

        let mut values = vec![Value::Integer(owner.0)];
        values.extend(terms.into_iter().map(Value::Text));
        values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row_to_node(row, 0)?,
                    opt_relationship(row, NODE_WIDTH)?,
                    opt_node(row, NODE_WIDTH + REL_WIDTH)?,
                ))
            })
            .map_err(db_err)?;

        for row in rows {
            let (node, relationship, neighbor) = row.map_err(db_err)?;
            sub.add_node(node);
            if let (Some(relationship), Some(neighbor)) = (relationship, neighbor) {
                sub.add_relationship(relationship);
                sub.add_node(neighbor);
            }
        }
        Ok(sub)
    }

    fn owner_sample(conn: &Connection, owner: OwnerId, limit: usize) -> Result<Subgraph> {
        let sql = format!(
            "SELECT {s}, {r}, {t} FROM graph_relationships r
             JOIN graph_nodes s ON s.id = r.source_id AND s.owner = r.owner
             JOIN graph_nodes t ON t.id = r.target_id AND t.owner = r.owner
             WHERE r.owner = ?1
             ORDER BY r.seq
             LIMIT ?2",
            s = aliased(NODE_COLUMNS, "s"),
            r = aliased(REL_COLUMNS, "r"),
            t = aliased(NODE_COLUMNS, "t"),
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![owner.0, i64::try_from(limit).unwrap_or(i64::MAX)],
                |row| {
                    Ok((
                        row_to_node(row, 0)?,
                        row_to_relationship(row, NODE_WIDTH)?,
                        row_to_node(row, NODE_WIDTH + REL_WIDTH)?,
                    ))
                },
            )
            .map_err(db_err)?;

        let mut sub = Subgraph::new();
        for row in rows {
            let (source, relationship, target) = row.map_err(db_err)?;
            sub.add_node(source);
            sub.add_relationship(relationship);
            sub.add_node(target);
        }
        Ok(sub)
    }

    fn document_neighborhood(
        conn: &Connection,
        owner: OwnerId,
        document: &NodeId,
    ) -> Result<Subgraph> {
        let mut sub = Subgraph::new();
        let doc = conn
            .query_row(
                &format!(
                    "SELECT {} FROM graph_nodes WHERE id = ?1 AND owner = ?2",
                    NODE_COLUMNS
                ),
                params![document.as_str(), owner.0],
                |row| row_to_node(row, 0),
            )
            .optional()
            .map_err(db_err)?;
        let Some(doc) = doc else {
            return Ok(sub);
        };
        sub.add_node(doc);

        let outgoing_sql = format!(
            "SELECT {r}, {t} FROM graph_relationships r
             JOIN graph_nodes t ON t.id = r.target_id AND t.owner = r.owner
             WHERE r.source_id = ?1 AND r.owner = ?2
             ORDER BY r.seq",
            r = aliased(REL_COLUMNS, "r"),
            t = aliased(NODE_COLUMNS, "t"),
        );
        let related_sql = format!(
            "SELECT {r}, {m} FROM graph_relationships r
             JOIN graph_nodes m
                ON m.id = CASE WHEN r.source_id = ?1 THEN r.target_id ELSE r.source_id END
                AND m.owner = r.owner
             WHERE (r.source_id = ?1 OR r.target_id = ?1) AND r.owner = ?2 AND m.id <> ?3
             ORDER BY r.seq",
            r = aliased(REL_COLUMNS, "r"),
            m = aliased(NODE_COLUMNS, "m"),
        );

        let outgoing = query_pairs(conn, &outgoing_sql, params![document.as_str(), owner.0])?;
        let mut related_stmt = conn.prepare(&related_sql).map_err(db_err)?;
        for (relationship, target) in outgoing {
            let rel_type = relationship.rel_type.clone();
            let target_id = target.id.clone();
            sub.add_relationship(relationship);
            sub.add_node(target);

            if rel_type == rel::HAS_STRUCTURE {
                let children =
                    query_pairs(conn, &outgoing_sql, params![target_id.as_str(), owner.0])?;
                for (child_rel, child) in children {
                    sub.add_relationship(child_rel);
                    sub.add_node(child);
                }
                continue;
            }
            if rel_type != rel::MENTIONS {
                continue;
            }

            let related = related_stmt
                .query_map(
                    params![target_id.as_str(), owner.0, document.as_str()],
                    |row| {
                        Ok((
                            row_to_relationship(row, 0)?,
                            row_to_node(row, REL_WIDTH)?,
                        ))
                    },
                )
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            for (relationship, node) in related {
                sub.add_relationship(relationship);
                sub.add_node(node);
            }
        }
        Ok(sub)
    }
}

impl GraphStore for SqliteGraphStore {
    fn backend(&self) -> BackendKind {
        BackendKind::External
    }

    fn verify_connectivity(&self) -> Result<()> {
        let conn = self.session()?;
        let one: i64 = conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(db_err)?;
        if one == 1 {
            Ok(())
        } else {
            Err(Error::StoreUnavailable(format!(
                "connectivity check returned {}",
                one
            )))
        }
    }

    fn create_node(&self, label: &str, properties: Properties, owner: OwnerId) -> Result<Node> {
        let node = Node {
            id: NodeId(uuid::Uuid::new_v4().to_string()),
            label: sanitize_label(label, "Entity"),
            properties: properties.sanitized(),
            owner,
            created_at: now_millis(),
        };
        let props_json = serde_json::to_string(&node.properties)?;
        let name = node.name();

        let conn = self.session()?;
        conn.execute(
            "INSERT INTO graph_nodes (id, label, name, name_lower, owner, properties_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                node.id.as_str(),
                node.label,
                name,
                name.to_lowercase(),
                owner.0,
                props_json,
                node.created_at
            ],
        )
        .map_err(db_err)?;
        debug!("Created node {} ({}) for owner {}", node.id, node.label, owner);
        Ok(node)
    }

    fn create_relationship(
        &self,
        source: &NodeId,
        target: &NodeId,
        rel_type: &str,
        properties: Properties,
        owner: OwnerId,
    ) -> Result<Relationship> {
        let relationship = Relationship {
            id: RelationshipId(uuid::Uuid::new_v4().to_string()),
            source: source.clone(),
            target: target.clone(),
            rel_type: sanitize_label(rel_type, "RELATED_TO"),
            properties: properties.sanitized(),
            owner,
            created_at: now_millis(),
        };
        let props_json = serde_json::to_string(&relationship.properties)?;

        let mut conn = self.session()?;
        let tx = conn.transaction().map_err(db_err)?;
        let exists = |id: &NodeId| -> Result<bool> {
            tx.query_row(
                "SELECT COUNT(*) FROM graph_nodes WHERE id = ?1 AND owner = ?2",
                params![id.as_str(), owner.0],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n > 0)
            .map_err(db_err)
        };
        if !exists(source)? || !exists(target)? {
            return Err(Error::nodes_not_found(source.as_str(), target.as_str()));
        }

        tx.execute(
            "INSERT INTO graph_relationships
                (id, source_id, target_id, rel_type, owner, properties_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                relationship.id.as_str(),
                source.as_str(),
                target.as_str(),
                relationship.rel_type,
                owner.0,
                props_json,
                relationship.created_at
            ],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        Ok(relationship)
    }

    fn nodes_by_owner(&self, owner: OwnerId) -> Result<Vec<Node>> {
        let conn = self.session()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM graph_nodes WHERE owner = ?1 ORDER BY seq",
                NODE_COLUMNS
            ))
            .map_err(db_err)?;
        let nodes = stmt
            .query_map(params![owner.0], |row| row_to_node(row, 0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(nodes)
    }

    fn relationships_by_owner(&self, owner: OwnerId) -> Result<Vec<Relationship>> {
        let conn = self.session()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM graph_relationships WHERE owner = ?1 ORDER BY seq",
                REL_COLUMNS
            ))
            .map_err(db_err)?;
        let rels = stmt
            .query_map(params![owner.0], |row| row_to_relationship(row, 0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rels)
    }

    fn graph_overview(&self, owner: OwnerId) -> Result<GraphOverview> {
        let limits = OverviewLimits::default();
        let conn = self.session()?;

        let node_types = Self::type_counts(
            &conn,
            "SELECT label, COUNT(*) FROM graph_nodes WHERE owner = ?1 GROUP BY label",
            owner,
        )?;
        let relationship_types = Self::type_counts(
            &conn,
            "SELECT rel_type, COUNT(*) FROM graph_relationships WHERE owner = ?1 GROUP BY rel_type",
            owner,
        )?;

        let mut node_stmt = conn
            .prepare(&format!(
                "SELECT {} FROM graph_nodes WHERE owner = ?1 ORDER BY seq LIMIT ?2",
                NODE_COLUMNS
            ))
            .map_err(db_err)?;
        let nodes = node_stmt
            .query_map(
                params![owner.0, i64::try_from(limits.max_nodes).unwrap_or(i64::MAX)],
                |row| row_to_node(row, 0),
            )
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        let mut rel_stmt = conn
            .prepare(&format!(
                "SELECT {} FROM graph_relationships WHERE owner = ?1 ORDER BY seq LIMIT ?2",
                REL_COLUMNS
            ))
            .map_err(db_err)?;
        let relationships = rel_stmt
            .query_map(
                params![
                    owner.0,
                    i64::try_from(limits.max_relationships).unwrap_or(i64::MAX)
                ],
                |row| row_to_relationship(row, 0),
            )
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        Ok(GraphOverview {
            graph_data: GraphData {
                nodes: nodes.iter().map(NodeView::from).collect(),
                links: relationships.iter().map(LinkView::from).collect(),
            },
            stats: GraphStats {
                node_count: node_types.iter().map(|(_, n)| n).sum(),
                relationship_count: relationship_types.iter().map(|(_, n)| n).sum(),
                node_types: node_types.into_iter().collect(),
                relationship_types: relationship_types.into_iter().collect(),
            },
        })
    }

    fn query_subgraph(&self, query: &SubgraphQuery) -> Result<Subgraph> {
        let conn = self.session()?;
        match query {
            SubgraphQuery::NameContains {
                owner,
                terms,
                limit,
            } => Self::name_contains(&conn, *owner, terms, *limit),
            SubgraphQuery::OwnerSample { owner, limit } => {
                Self::owner_sample(&conn, *owner, *limit)
            }
            SubgraphQuery::DocumentNeighborhood { owner, document } => {
                Self::document_neighborhood(&conn, *owner, document)
            }
        }
    }

    fn clear(&self) -> Result<()> {
        let conn = self.session()?;
        conn.execute_batch(
            "DELETE FROM graph_relationships;
             DELETE FROM graph_nodes;",
        )
        .map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn json_column(idx: usize, e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn row_to_node(row: &Row<'_>, offset: usize) -> rusqlite::Result<Node> {
    let props_json: String = row.get(offset + 3)?;
    Ok(Node {
        id: NodeId(row.get(offset)?),
        label: row.get(offset + 1)?,
        owner: OwnerId(row.get(offset + 2)?),
        properties: serde_json::from_str(&props_json).map_err(|e| json_column(offset + 3, e))?,
        created_at: row.get(offset + 4)?,
    })
}

fn row_to_relationship(row: &Row<'_>, offset: usize) -> rusqlite::Result<Relationship> {
    let props_json: String = row.get(offset + 5)?;
    Ok(Relationship {
        id: RelationshipId(row.get(offset)?),
        source: NodeId(row.get(offset + 1)?),
        target: NodeId(row.get(offset + 2)?),
        rel_type: row.get(offset + 3)?,
        owner: OwnerId(row.get(offset + 4)?),
        properties: serde_json::from_str(&props_json).map_err(|e| json_column(offset + 5, e))?,
        created_at: row.get(offset + 6)?,
    })
}

/// A node from a LEFT JOIN; `None` when the joined row is absent.
fn opt_node(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Node>> {
    match row.get::<_, Option<String>>(offset)? {
        Some(_) => row_to_node(row, offset).map(Some),
        None => Ok(None),
    }
}

fn opt_relationship(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Relationship>> {
    match row.get::<_, Option<String>>(offset)? {
        Some(_) => row_to_relationship(row, offset).map(Some),
        None => Ok(None),
    }
}

fn query_pairs<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<(Relationship, Node)>> {
    let mut stmt = conn.prepare(sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((row_to_relationship(row, 0)?, row_to_node(row, REL_WIDTH)?))
        })
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;
    Ok(rows)
}
