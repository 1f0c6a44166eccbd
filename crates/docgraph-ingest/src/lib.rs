//! docgraph ingest: text extraction, chunking, entity extraction and graph building.

pub mod chunking;
pub mod extract;
pub mod file;
pub mod ingest;

pub use chunking::{Chunker, DocumentChunk};
pub use extract::{
    extract_graph, Entity, EntityKind, ExtractedGraph, ExtractedRelationship, RelationType,
};
pub use file::{extract, ExtractedDocument, FileFormat, Metadata, PageText, StructureSummary};
pub use ingest::{content_hash, DocumentSummary, GraphBuilder, IngestReport};
