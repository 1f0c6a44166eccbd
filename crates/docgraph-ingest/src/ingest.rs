//! Document ingestion pipeline: file → text → entities + chunks → graph.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use docgraph_core::{Error, Result};
use docgraph_store::{
    build_overview, rel, GraphData, GraphStats, GraphStore, Node, NodeId, OverviewLimits, OwnerId,
    Properties, Relationship,
};

use crate::chunking::Chunker;
use crate::extract::{extract_graph, EntityKind};
use crate::file::{self, ExtractedDocument, StructureSummary};
use crate::extract::relations::MAX_SENTENCE_CHARS;

/// Characters of document text kept on the `Document` node.
pub const CONTENT_PREVIEW_CHARS: usize = 1000;

/// Labels left out of the report's entity list.
const NON_ENTITY_LABELS: &[&str] = &["Document", "Chunk", "Metadata"];

/// Short description of the ingested document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    /// Nodes created by this ingest.
    pub node_count: usize,
    /// Relationships created by this ingest.
    pub relationship_count: usize,
    pub file_type: String,
}

/// Outcome of one ingest, with the owner's refreshed overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub success: bool,
    pub document: DocumentSummary,
    /// Display names of created nodes other than document, chunk and metadata.
    pub entities: Vec<String>,
    pub chunks: usize,
    pub graph_data: GraphData,
    pub stats: GraphStats,
}

/// Writes an extracted document into a graph store.
pub struct GraphBuilder {
    store: Arc<dyn GraphStore>,
    chunker: Chunker,
}

/// Nodes and relationships written during one ingest.
struct Written<'s> {
    store: &'s dyn GraphStore,
    owner: OwnerId,
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

impl<'s> Written<'s> {
    fn node(&mut self, label: &str, properties: Properties) -> Option<NodeId> {
        match self.store.create_node(label, properties, self.owner) {
            Ok(node) => {
                let id = node.id.clone();
                self.nodes.push(node);
                Some(id)
            }
            Err(e) => {
                warn!("Failed to create {} node: {}", label, e);
                None
            }
        }
    }

    fn link(&mut self, source: &NodeId, target: &NodeId, rel_type: &str, properties: Properties) {
        match self
            .store
            .create_relationship(source, target, rel_type, properties, self.owner)
        {
            Ok(rel) => self.relationships.push(rel),
            Err(e) => warn!("Failed to create {} relationship: {}", rel_type, e),
        }
    }

    /// Create a child node and link it from `parent`.
    fn child(
        &mut self,
        parent: &NodeId,
        rel_type: &str,
        edge: Properties,
        label: &str,
        properties: Properties,
    ) {
        if let Some(id) = self.node(label, properties) {
            self.link(parent, &id, rel_type, edge);
        }
    }
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn GraphStore>, chunker: Chunker) -> Self {
        Self { store, chunker }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Ingest a file for `owner`. Only extraction and the document node are
    /// fatal; every later step logs its failures and carries on.
    pub fn ingest(
        &self,
        path: &Path,
        owner: OwnerId,
        file_name: &str,
        declared_type: Option<&str>,
    ) -> Result<IngestReport> {
        self.build(path, Some(path), owner, file_name, declared_type)
    }

    /// Read `path` into the graph. `recorded_path` is the `filePath` kept on
    /// the document node, if any.
    fn build(
        &self,
        path: &Path,
        recorded_path: Option<&Path>,
        owner: OwnerId,
        file_name: &str,
        declared_type: Option<&str>,
    ) -> Result<IngestReport> {
        info!("Processing document {} for owner {}", file_name, owner);
        let extension = file_extension(file_name);
        let document = file::extract(path, declared_type)?;

        let mut written = Written {
            store: self.store.as_ref(),
            owner,
            nodes: Vec::new(),
            relationships: Vec::new(),
        };

        let file_type = declared_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| extension.clone());
        let doc_props = document_properties(&document, recorded_path, file_name, &file_type);
        let doc_node = self
            .store
            .create_node("Document", doc_props, owner)
            .map_err(|e| Error::DocumentCreationFailed(e.to_string()))?;
        let doc_id = doc_node.id.clone();
        written.nodes.push(doc_node);

        if !document.metadata.is_empty() {
            let mut props = Properties::named(format!("Metadata for {}", file_name));
            for (key, value) in &document.metadata {
                if key != "name" {
                    props.insert(key, value.clone());
                }
            }
            written.child(&doc_id, rel::HAS_METADATA, Properties::new(), "Metadata", props);
        }

        if let Some(structure) = &document.structure {
            write_structure(&mut written, &doc_id, structure);
        }

        let graph = extract_graph(&document.text);
        debug!(
            "Extracted {} entities and {} relationships from {}",
            graph.entities.len(),
            graph.relationships.len(),
            file_name
        );
        let mut entity_ids: HashMap<(String, EntityKind), NodeId> = HashMap::new();
        for entity in &graph.entities {
            let props = Properties::named(entity.name.as_str()).with("mentions", entity.mentions);
            if let Some(id) = written.node(entity.kind.label(), props) {
                written.link(
                    &doc_id,
                    &id,
                    rel::MENTIONS,
                    Properties::new().with_count(entity.mentions),
                );
                entity_ids.insert((entity.name.clone(), entity.kind), id);
            }
        }
        for relationship in &graph.relationships {
            let source = entity_ids.get(&(relationship.source.clone(), relationship.source_kind));
            let target = entity_ids.get(&(relationship.target.clone(), relationship.target_kind));
            if let (Some(source), Some(target)) = (source, target) {
                let sentence: String =
                    relationship.sentence.chars().take(MAX_SENTENCE_CHARS).collect();
                written.link(
                    source,
                    target,
                    relationship.rel_type.as_str(),
                    Properties::new().with_sentence(sentence),
                );
            }
        }

        let chunks = self.chunker.chunk(&document.text, &document.metadata);
        let mut chunk_count = 0;
        for chunk in &chunks {
            let props = Properties::named(format!("Chunk {} of {}", chunk.index + 1, file_name))
                .with_content(chunk.text.as_str())
                .with_index(chunk.index);
            if let Some(id) = written.node("Chunk", props) {
                chunk_count += 1;
                written.link(&doc_id, &id, rel::HAS_CHUNK, Properties::new().with_index(chunk.index));
            }
        }

        // Writes above are committed; fall back to this ingest's own graph.
        let overview = match self.store.graph_overview(owner) {
            Ok(overview) => overview,
            Err(e) => {
                warn!(
                    "Failed to load graph overview for owner {}, reporting this ingest only: {}",
                    owner, e
                );
                build_overview(&written.nodes, &written.relationships, OverviewLimits::default())
            }
        };
        info!(
            "Ingested {} as document {}: {} nodes, {} relationships, {} chunks",
            file_name,
            doc_id,
            written.nodes.len(),
            written.relationships.len(),
            chunk_count
        );

        Ok(IngestReport {
            success: true,
            document: DocumentSummary {
                id: doc_id.to_string(),
                name: file_name.to_string(),
                node_count: written.nodes.len(),
                relationship_count: written.relationships.len(),
                file_type: extension,
            },
            entities: written
                .nodes
                .iter()
                .filter(|n| !NON_ENTITY_LABELS.contains(&n.label.as_str()))
                .map(Node::name)
                .collect(),
            chunks: chunk_count,
            graph_data: overview.graph_data,
            stats: overview.stats,
        })
    }

    /// Spool `bytes` to a temporary file named like `file_name` and ingest it.
    /// The document node records no `filePath`, since the spool is removed.
    pub fn ingest_bytes(
        &self,
        bytes: &[u8],
        owner: OwnerId,
        file_name: &str,
        declared_type: Option<&str>,
    ) -> Result<IngestReport> {
        let suffix = match file_extension(file_name) {
            ext if ext.is_empty() => String::new(),
            ext => format!(".{}", ext),
        };
        let mut spool = tempfile::Builder::new()
            .prefix("docgraph-upload-")
            .suffix(&suffix)
            .tempfile()?;
        spool.write_all(bytes)?;
        spool.flush()?;
        self.build(spool.path(), None, owner, file_name, declared_type)
    }
}

fn document_properties(
    document: &ExtractedDocument,
    path: Option<&Path>,
    file_name: &str,
    file_type: &str,
) -> Properties {
    let preview: String = document.text.chars().take(CONTENT_PREVIEW_CHARS).collect();
    let mut props = Properties::named(file_name)
        .with_content(preview)
        .with("fileName", file_name)
        .with("fileType", file_type)
        .with("format", document.format.as_str())
        .with("contentHash", content_hash(&document.text));
    if let Some(path) = path {
        props.insert("filePath", path.display().to_string());
    }
    if let Some(summary) = &document.summary {
        props.insert("summary", summary.as_str());
    }
    props
}

fn write_structure(written: &mut Written<'_>, doc_id: &NodeId, structure: &StructureSummary) {
    match structure {
        StructureSummary::Tabular {
            columns,
            row_count,
            delimiter,
        } => {
            let props = Properties::named(format!(
                "CSV Data ({} columns, {} rows)",
                columns.len(),
                row_count
            ))
            .with("column_count", columns.len())
            .with("row_count", *row_count)
            .with("delimiter", delimiter.to_string());
            let Some(id) = structure_node(written, doc_id, "CSVStructure", props) else {
                return;
            };
            for (i, column) in columns.iter().enumerate() {
                written.child(
                    &id,
                    rel::HAS_COLUMN,
                    Properties::new().with_index(i),
                    "CSVColumn",
                    Properties::named(column.as_str()).with_index(i),
                );
            }
        }
        StructureSummary::JsonObject { keys } => {
            let props = Properties::named("JSON Structure (object)")
                .with("structure_type", "object")
                .with("keys", keys.join(", "))
                .with("key_count", keys.len());
            if let Some(id) = structure_node(written, doc_id, "JSONStructure", props) {
                json_keys(written, &id, keys);
            }
        }
        StructureSummary::JsonArray { count, sample_keys } => {
            let mut props = Properties::named("JSON Structure (array)")
                .with("structure_type", "array")
                .with("item_count", *count);
            if !sample_keys.is_empty() {
                props.insert("sample_keys", sample_keys.join(", "));
            }
            if let Some(id) = structure_node(written, doc_id, "JSONStructure", props) {
                json_keys(written, &id, sample_keys);
            }
        }
        StructureSummary::JsonScalar => {
            let props = Properties::named("JSON Structure (scalar)").with("structure_type", "scalar");
            structure_node(written, doc_id, "JSONStructure", props);
        }
        StructureSummary::Xml {
            root_tag,
            element_count,
            attribute_count,
            child_count,
        } => {
            let props = Properties::named(format!("XML Document <{}>", root_tag))
                .with("root_tag", root_tag.as_str())
                .with("element_count", *element_count)
                .with("attribute_count", *attribute_count);
            if let Some(id) = structure_node(written, doc_id, "XMLStructure", props) {
                written.child(
                    &id,
                    rel::HAS_ROOT_ELEMENT,
                    Properties::new(),
                    "XMLElement",
                    Properties::named(root_tag.as_str())
                        .with("tag", root_tag.as_str())
                        .with("is_root", true)
                        .with("child_count", *child_count),
                );
            }
        }
        StructureSummary::Spreadsheet { sheets } => {
            let props = Properties::named(format!("Excel Workbook ({} sheets)", sheets.len()))
                .with("sheet_count", sheets.len());
            let Some(id) = structure_node(written, doc_id, "ExcelWorkbook", props) else {
                return;
            };
            for (i, sheet) in sheets.iter().enumerate() {
                written.child(
                    &id,
                    rel::HAS_SHEET,
                    Properties::new().with_index(i),
                    "ExcelSheet",
                    Properties::named(sheet.as_str()).with_index(i),
                );
            }
        }
    }
}

fn structure_node(
    written: &mut Written<'_>,
    doc_id: &NodeId,
    label: &str,
    properties: Properties,
) -> Option<NodeId> {
    let id = written.node(label, properties)?;
    written.link(doc_id, &id, rel::HAS_STRUCTURE, Properties::new());
    Some(id)
}

fn json_keys(written: &mut Written<'_>, structure: &NodeId, keys: &[String]) {
    for key in keys {
        written.child(
            structure,
            rel::HAS_PROPERTY,
            Properties::new(),
            "JSONKey",
            Properties::named(key.as_str()),
        );
    }
}

/// Lowercased extension of a file name, empty when it has none.
fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Compute SHA-256 content hash.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
