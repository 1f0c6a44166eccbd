//! The `GraphStore` capability set implemented by every backend.

use std::collections::BTreeMap;

use docgraph_core::Result;

use crate::types::*;

/// Well-known relationship types written by the graph builder.
pub mod rel {
    pub const HAS_METADATA: &str = "HAS_METADATA";
    pub const HAS_STRUCTURE: &str = "HAS_STRUCTURE";
    pub const HAS_CHUNK: &str = "HAS_CHUNK";
    pub const MENTIONS: &str = "MENTIONS";
    pub const HAS_COLUMN: &str = "HAS_COLUMN";
    pub const HAS_PROPERTY: &str = "HAS_PROPERTY";
    pub const HAS_ROOT_ELEMENT: &str = "HAS_ROOT_ELEMENT";
    pub const HAS_SHEET: &str = "HAS_SHEET";
}

/// Owner-scoped property graph storage.
///
/// Implementations must be safe to share across request handlers. Node and
/// relationship ids are unique per store instance and never reused.
pub trait GraphStore: Send + Sync {
    /// Which backend this is.
    fn backend(&self) -> BackendKind;

    /// No-op round trip against the backend.
    fn verify_connectivity(&self) -> Result<()>;

    /// Create a node owned by `owner`.
    fn create_node(&self, label: &str, properties: Properties, owner: OwnerId) -> Result<Node>;

    /// Create a directed relationship. Fails with `Error::NodesNotFound`
    /// without writing anything when either endpoint is missing or belongs
    /// to a different owner.
    fn create_relationship(
        &self,
        source: &NodeId,
        target: &NodeId,
        rel_type: &str,
        properties: Properties,
        owner: OwnerId,
    ) -> Result<Relationship>;

    /// All nodes of an owner, in insertion order.
    fn nodes_by_owner(&self, owner: OwnerId) -> Result<Vec<Node>>;

    /// All relationships of an owner, in insertion order.
    fn relationships_by_owner(&self, owner: OwnerId) -> Result<Vec<Relationship>>;

    /// Run a typed subgraph query.
    fn query_subgraph(&self, query: &SubgraphQuery) -> Result<Subgraph>;

    /// Remove every node and relationship of every owner.
    fn clear(&self) -> Result<()>;

    /// Bounded sample with exact counts. Backends with cheaper counting
    /// override this.
    fn graph_overview(&self, owner: OwnerId) -> Result<GraphOverview> {
        let nodes = self.nodes_by_owner(owner)?;
        let relationships = self.relationships_by_owner(owner)?;
        Ok(build_overview(&nodes, &relationships, OverviewLimits::default()))
    }

    fn health(&self) -> Health {
        Health {
            connected: self.verify_connectivity().is_ok(),
            backend: self.backend(),
        }
    }
}

/// Cap samples while counting everything.
pub fn build_overview(
    nodes: &[Node],
    relationships: &[Relationship],
    limits: OverviewLimits,
) -> GraphOverview {
    let mut node_types: BTreeMap<String, usize> = BTreeMap::new();
    for node in nodes {
        *node_types.entry(node.label.clone()).or_default() += 1;
    }
    let mut relationship_types: BTreeMap<String, usize> = BTreeMap::new();
    for rel in relationships {
        *relationship_types.entry(rel.rel_type.clone()).or_default() += 1;
    }

    GraphOverview {
        graph_data: GraphData {
            nodes: nodes.iter().take(limits.max_nodes).map(NodeView::from).collect(),
            links: relationships
                .iter()
                .take(limits.max_relationships)
                .map(LinkView::from)
                .collect(),
        },
        stats: GraphStats {
            node_count: nodes.len(),
            relationship_count: relationships.len(),
            node_types,
            relationship_types,
        },
    }
}

/// Lowercase, trim and drop empty search terms.
pub(crate) fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
