//! Embedded graph backend on a petgraph `StableDiGraph`.
//!
//! Everything lives in process memory behind one mutex: the graph, the id
//! lookup, and per-owner insertion-ordered index lists. Ids come from a
//! monotonic counter shared by nodes and relationships and survive `clear`,
//! so an id is never handed out twice by the same instance.

use std::collections::HashMap;

use parking_lot::Mutex;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use docgraph_core::{Error, Result};

use crate::graph::{normalize_terms, now_millis, rel, GraphStore};
use crate::types::*;

#[derive(Default)]
struct MemoryGraph {
    graph: StableDiGraph<Node, Relationship>,
    node_index: HashMap<NodeId, NodeIndex>,
    owner_nodes: HashMap<OwnerId, Vec<NodeIndex>>,
    owner_edges: HashMap<OwnerId, Vec<EdgeIndex>>,
    next_id: u64,
}

impl MemoryGraph {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    /// Resolve a node id, only if it belongs to `owner`.
    fn owned(&self, id: &NodeId, owner: OwnerId) -> Option<NodeIndex> {
        self.node_index
            .get(id)
            .copied()
            .filter(|idx| self.graph[*idx].owner == owner)
    }

    /// Edges touching `idx` in either direction, in insertion order, each once.
    fn incident_edges(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        edges.sort();
        edges.dedup();
        edges
    }

    /// Outgoing edges of `idx` in insertion order.
    fn outgoing_edges(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        edges.sort();
        edges
    }

    fn other_end(&self, edge: EdgeIndex, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edge_endpoints(edge)
            .map(|(s, t)| if s == idx { t } else { s })
    }

    fn name_contains(&self, owner: OwnerId, terms: &[String], limit: usize) -> Subgraph {
        let terms = normalize_terms(terms);
        let mut sub = Subgraph::new();
        if terms.is_empty() || limit == 0 {
            return sub;
        }
        let mut rows = 0usize;

        for &idx in self.owner_nodes.get(&owner).into_iter().flatten() {
            let node = &self.graph[idx];
            let name = node.name().to_lowercase();
            if !terms.iter().any(|t| name.contains(t.as_str())) {
                continue;
            }

            let mut linked = false;
            for edge in self.incident_edges(idx) {
                let relationship = &self.graph[edge];
                let Some(other_idx) = self.other_end(edge, idx) else {
                    continue;
                };
                let other = &self.graph[other_idx];
                if relationship.owner != owner || other.owner != owner {
                    continue;
                }
                if rows >= limit {
                    return sub;
                }
                sub.add_node(node.clone());
                sub.add_relationship(relationship.clone());
                sub.add_node(other.clone());
                rows += 1;
                linked = true;
            }

            if !linked {
                if rows >= limit {
                    return sub;
                }
                sub.add_node(node.clone());
                rows += 1;
            }
        }
        sub
    }

    fn owner_sample(&self, owner: OwnerId, limit: usize) -> Subgraph {
        let mut sub = Subgraph::new();
        let mut rows = 0usize;
        for &edge in self.owner_edges.get(&owner).into_iter().flatten() {
            if rows >= limit {
                break;
            }
            let Some((s, t)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let (source, target) = (&self.graph[s], &self.graph[t]);
            if source.owner != owner || target.owner != owner {
                continue;
            }
            sub.add_node(source.clone());
            sub.add_relationship(self.graph[edge].clone());
            sub.add_node(target.clone());
            rows += 1;
        }
        sub
    }

    fn document_neighborhood(&self, owner: OwnerId, document: &NodeId) -> Subgraph {
        let mut sub = Subgraph::new();
        let Some(doc_idx) = self.owned(document, owner) else {
            return sub;
        };
        sub.add_node(self.graph[doc_idx].clone());

        for edge in self.outgoing_edges(doc_idx) {
            let relationship = &self.graph[edge];
            let Some(target_idx) = self.other_end(edge, doc_idx) else {
                continue;
            };
            let target = &self.graph[target_idx];
            if relationship.owner != owner || target.owner != owner {
                continue;
            }
            sub.add_relationship(relationship.clone());
            sub.add_node(target.clone());

            if relationship.rel_type == rel::HAS_STRUCTURE {
                for child_edge in self.outgoing_edges(target_idx) {
                    let Some(child_idx) = self.other_end(child_edge, target_idx) else {
                        continue;
                    };
                    let (child, child_rel) = (&self.graph[child_idx], &self.graph[child_edge]);
                    if child.owner != owner || child_rel.owner != owner {
                        continue;
                    }
                    sub.add_relationship(child_rel.clone());
                    sub.add_node(child.clone());
                }
                continue;
            }
            if relationship.rel_type != rel::MENTIONS {
                continue;
            }
            for related_edge in self.incident_edges(target_idx) {
                let Some(related_idx) = self.other_end(related_edge, target_idx) else {
                    continue;
                };
                if related_idx == doc_idx {
                    continue;
                }
                let related = &self.graph[related_idx];
                let related_rel = &self.graph[related_edge];
                if related.owner != owner || related_rel.owner != owner {
                    continue;
                }
                sub.add_relationship(related_rel.clone());
                sub.add_node(related.clone());
            }
        }
        sub
    }
}

/// In-memory graph store.
pub struct MemoryGraphStore {
    inner: Mutex<MemoryGraph>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryGraph::default()),
        }
    }

    /// Total nodes across all owners.
    pub fn node_count(&self) -> usize {
        self.inner.lock().graph.node_count()
    }

    /// Total relationships across all owners.
    pub fn relationship_count(&self) -> usize {
        self.inner.lock().graph.edge_count()
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for MemoryGraphStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn verify_connectivity(&self) -> Result<()> {
        Ok(())
    }

    fn create_node(&self, label: &str, properties: Properties, owner: OwnerId) -> Result<Node> {
        let mut inner = self.inner.lock();
        let node = Node {
            id: NodeId(inner.allocate_id()),
            label: sanitize_label(label, "Entity"),
            properties: properties.sanitized(),
            owner,
            created_at: now_millis(),
        };
        let idx = inner.graph.add_node(node.clone());
        inner.node_index.insert(node.id.clone(), idx);
        inner.owner_nodes.entry(owner).or_default().push(idx);
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
        let mut inner = self.inner.lock();
        let (Some(s), Some(t)) = (inner.owned(source, owner), inner.owned(target, owner)) else {
            return Err(Error::nodes_not_found(source.as_str(), target.as_str()));
        };
        let relationship = Relationship {
            id: RelationshipId(inner.allocate_id()),
            source: source.clone(),
            target: target.clone(),
            rel_type: sanitize_label(rel_type, "RELATED_TO"),
            properties: properties.sanitized(),
            owner,
            created_at: now_millis(),
        };
        let edge = inner.graph.add_edge(s, t, relationship.clone());
        inner.owner_edges.entry(owner).or_default().push(edge);
        Ok(relationship)
    }

    fn nodes_by_owner(&self, owner: OwnerId) -> Result<Vec<Node>> {
        let inner = self.inner.lock();
        Ok(inner
            .owner_nodes
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|idx| inner.graph[*idx].clone())
            .collect())
    }

    fn relationships_by_owner(&self, owner: OwnerId) -> Result<Vec<Relationship>> {
        let inner = self.inner.lock();
        Ok(inner
            .owner_edges
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|idx| inner.graph[*idx].clone())
            .collect())
    }

    fn query_subgraph(&self, query: &SubgraphQuery) -> Result<Subgraph> {
        let inner = self.inner.lock();
        Ok(match query {
            SubgraphQuery::NameContains {
                owner,
                terms,
                limit,
            } => inner.name_contains(*owner, terms, *limit),
            SubgraphQuery::OwnerSample { owner, limit } => inner.owner_sample(*owner, *limit),
            SubgraphQuery::DocumentNeighborhood { owner, document } => {
                inner.document_neighborhood(*owner, document)
            }
        })
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.graph.clear();
        inner.node_index.clear();
        inner.owner_nodes.clear();
        inner.owner_edges.clear();
        Ok(())
    }
}
