//! Graph data model shared by every backend: ids, typed properties, nodes,
//! relationships, and the serialized views handed to callers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Length of the id prefix used in derived display names.
const SHORT_ID_LEN: usize = 8;

/// Keys backed by a typed field of [`Properties`].
const WELL_KNOWN_KEYS: &[&str] = &["name", "title", "content", "index", "count", "sentence"];

/// Identifier of the user that owns a node or relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OwnerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Backend-assigned node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Backend-assigned relationship identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(NodeId);
string_id!(RelationshipId);

/// A scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Convert a JSON scalar. Arrays, objects and null are not representable.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<usize> for PropertyValue {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

/// Non-finite floats have no JSON form and are kept as text.
impl From<f64> for PropertyValue {
    fn from(x: f64) -> Self {
        if x.is_finite() {
            Self::Float(x)
        } else {
            Self::Text(x.to_string())
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Node and relationship properties: well-known fields plus sanitized extras.
///
/// Serializes flat, so `{"name": "Acme", "mentions": 2}` round-trips with
/// `mentions` landing in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = i64::try_from(index).ok();
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = i64::try_from(count).ok();
        self
    }

    pub fn with_sentence(mut self, sentence: impl Into<String>) -> Self {
        self.sentence = Some(sentence.into());
        self
    }

    /// Builder form of [`Properties::insert`].
    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a property by key. Well-known keys fill their typed field when the
    /// value has the matching type; a mismatched value is kept in `extra` as
    /// `{key}_value`, and everything else goes to `extra` under a sanitized
    /// key. Non-finite floats are stored as text.
    pub fn insert(&mut self, key: &str, value: impl Into<PropertyValue>) {
        let key = sanitize_key(key);
        let value = match value.into() {
            PropertyValue::Float(x) => PropertyValue::from(x),
            value => value,
        };
        match (key.as_str(), value) {
            ("name", PropertyValue::Text(s)) => self.name = Some(s),
            ("title", PropertyValue::Text(s)) => self.title = Some(s),
            ("content", PropertyValue::Text(s)) => self.content = Some(s),
            ("sentence", PropertyValue::Text(s)) => self.sentence = Some(s),
            ("index", PropertyValue::Int(i)) => self.index = Some(i),
            ("count", PropertyValue::Int(i)) => self.count = Some(i),
            (well_known, value) if WELL_KNOWN_KEYS.contains(&well_known) => {
                self.extra.insert(format!("{}_value", well_known), value);
            }
            (_, value) => {
                self.extra.insert(key, value);
            }
        }
    }

    /// Look up a property by key across well-known fields and extras.
    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        match key {
            "name" => self.name.clone().map(PropertyValue::Text),
            "title" => self.title.clone().map(PropertyValue::Text),
            "content" => self.content.clone().map(PropertyValue::Text),
            "sentence" => self.sentence.clone().map(PropertyValue::Text),
            "index" => self.index.map(PropertyValue::Int),
            "count" => self.count.map(PropertyValue::Int),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Re-run key sanitization over `extra`, for values built by hand.
    pub fn sanitized(self) -> Self {
        let Properties {
            name,
            title,
            content,
            index,
            count,
            sentence,
            extra,
        } = self;
        let mut out = Properties {
            name,
            title,
            content,
            index,
            count,
            sentence,
            extra: BTreeMap::new(),
        };
        for (key, value) in extra {
            out.insert(&key, value);
        }
        out
    }
}

/// Restrict a property key to ASCII alphanumerics and underscores.
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Sanitize a node label or relationship type; never empty.
pub fn sanitize_label(label: &str, fallback: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Display name: first non-empty `name` or `title`, else `{label}_{shortId}`.
pub fn display_name(label: &str, id: &str, properties: &Properties) -> String {
    [&properties.name, &properties.title]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let short: String = id.chars().take(SHORT_ID_LEN).collect();
            format!("{}_{}", label, short)
        })
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub properties: Properties,
    pub owner: OwnerId,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
}

impl Node {
    pub fn name(&self) -> String {
        display_name(&self.label, self.id.as_str(), &self.properties)
    }
}

/// A directed edge between two nodes of the same owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: NodeId,
    pub target: NodeId,
    pub rel_type: String,
    pub properties: Properties,
    pub owner: OwnerId,
    pub created_at: i64,
}

/// Serialized node as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub name: String,
    pub properties: Properties,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.to_string(),
            label: node.label.clone(),
            name: node.name(),
            properties: node.properties.clone(),
        }
    }
}

/// Serialized relationship as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkView {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: Properties,
}

impl From<&Relationship> for LinkView {
    fn from(rel: &Relationship) -> Self {
        Self {
            id: rel.id.to_string(),
            source: rel.source.to_string(),
            target: rel.target.to_string(),
            rel_type: rel.rel_type.clone(),
            properties: rel.properties.clone(),
        }
    }
}

/// Nodes and links ready for visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
}

/// Exact counts for an owner's graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub relationship_count: usize,
    pub node_types: BTreeMap<String, usize>,
    pub relationship_types: BTreeMap<String, usize>,
}

/// Bounded sample of an owner's graph plus exact totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOverview {
    pub graph_data: GraphData,
    pub stats: GraphStats,
}

/// Sample caps applied by `graph_overview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewLimits {
    pub max_nodes: usize,
    pub max_relationships: usize,
}

impl Default for OverviewLimits {
    fn default() -> Self {
        Self {
            max_nodes: 100,
            max_relationships: 200,
        }
    }
}

/// Query result: nodes and relationships, each deduplicated by id and kept
/// in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Subgraph {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    #[serde(skip)]
    seen_nodes: HashSet<NodeId>,
    #[serde(skip)]
    seen_relationships: HashSet<RelationshipId>,
}

impl Subgraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node unless one with the same id is already present.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.seen_nodes.insert(node.id.clone()) {
            self.nodes.push(node);
            true
        } else {
            false
        }
    }

    /// Add a relationship unless one with the same id is already present.
    pub fn add_relationship(&mut self, rel: Relationship) -> bool {
        if self.seen_relationships.insert(rel.id.clone()) {
            self.relationships.push(rel);
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    pub fn contains_node_named(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name() == name)
    }

    pub fn to_graph_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes.iter().map(NodeView::from).collect(),
            links: self.relationships.iter().map(LinkView::from).collect(),
        }
    }
}

/// Typed subgraph query, translated by each backend into its own access path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubgraphQuery {
    /// Nodes whose display name contains any term (case-insensitive), each
    /// with its one-hop neighborhood. At most `limit` (node, edge, neighbor)
    /// rows; a matched node without edges counts as one row.
    NameContains {
        owner: OwnerId,
        terms: Vec<String>,
        limit: usize,
    },
    /// The first `limit` relationships of the owner with both endpoints.
    OwnerSample { owner: OwnerId, limit: usize },
    /// A document, everything it links to, the children of its structure
    /// nodes, and the other relationships of the entities it mentions.
    DocumentNeighborhood { owner: OwnerId, document: NodeId },
}

/// Which concrete backend serves the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Embedded,
    External,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Connectivity report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub connected: bool,
    pub backend: BackendKind,
}
