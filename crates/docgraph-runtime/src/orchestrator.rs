//! `DocGraph`, the service verbs over one store.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use docgraph_core::{ChunkingConfig, DocGraphConfig, Error, Result};
use docgraph_ingest::{Chunker, GraphBuilder, IngestReport};
use docgraph_resolve::{AnswerGenerator, GraphResolver, QueryResult, SummaryAnswerer};
use docgraph_store::{
    open_store, GraphData, GraphOverview, GraphStore, Health, NodeId, OwnerId, SubgraphQuery,
};

/// Document-to-graph service. Construct once and share.
pub struct DocGraph {
    store: Arc<dyn GraphStore>,
    builder: GraphBuilder,
    resolver: GraphResolver,
    answerer: Arc<dyn AnswerGenerator>,
}

impl DocGraph {
    pub fn new(
        store: Arc<dyn GraphStore>,
        answerer: Arc<dyn AnswerGenerator>,
        chunking: ChunkingConfig,
    ) -> Self {
        info!(
            "DocGraph initialized: backend={}, chunk_size={}, chunk_overlap={}",
            store.backend(),
            chunking.chunk_size,
            chunking.chunk_overlap
        );
        Self {
            builder: GraphBuilder::new(store.clone(), Chunker::from_config(&chunking)),
            resolver: GraphResolver::new(store.clone()),
            store,
            answerer,
        }
    }

    /// Open the configured store, falling back to the embedded one when the
    /// external database is unreachable, and answer with [`SummaryAnswerer`].
    pub fn from_config(config: &DocGraphConfig) -> Self {
        Self::new(
            open_store(&config.store),
            Arc::new(SummaryAnswerer),
            config.chunking,
        )
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Ingest a file on disk.
    pub fn ingest(
        &self,
        path: &Path,
        owner: OwnerId,
        file_name: &str,
        declared_type: Option<&str>,
    ) -> Result<IngestReport> {
        self.builder
            .ingest(path, owner, file_name, declared_type)
            .map_err(|e| {
                error!("Error creating knowledge graph for {}: {}", file_name, e);
                e
            })
    }

    /// Ingest uploaded bytes.
    pub fn ingest_bytes(
        &self,
        bytes: &[u8],
        owner: OwnerId,
        file_name: &str,
        declared_type: Option<&str>,
    ) -> Result<IngestReport> {
        self.builder
            .ingest_bytes(bytes, owner, file_name, declared_type)
            .map_err(|e| {
                error!("Error creating knowledge graph for {}: {}", file_name, e);
                e
            })
    }

    /// Answer a question from the owner's graph. Failures become an error
    /// response with an empty graph.
    pub fn query(&self, text: &str, owner: OwnerId) -> QueryResult {
        info!("Processing query '{}' for owner {}", text, owner);
        match self.resolver.resolve(text, owner) {
            Ok(resolution) => QueryResult {
                query: text.to_string(),
                response: self.answerer.answer(text, &resolution.subgraph),
                graph_data: resolution.subgraph.to_graph_data(),
            },
            Err(e) => {
                error!("Error querying knowledge graph: {}", e);
                QueryResult::error(text, e)
            }
        }
    }

    pub fn overview(&self, owner: OwnerId) -> Result<GraphOverview> {
        self.store.graph_overview(owner)
    }

    /// The document's neighborhood. `NotFound` when the owner has no such
    /// document.
    pub fn document_graph(&self, document: &NodeId, owner: OwnerId) -> Result<GraphData> {
        let subgraph = self.store.query_subgraph(&SubgraphQuery::DocumentNeighborhood {
            owner,
            document: document.clone(),
        })?;
        if subgraph.is_empty() {
            return Err(Error::NotFound(format!("document {}", document)));
        }
        Ok(subgraph.to_graph_data())
    }

    pub fn healthcheck(&self) -> Health {
        self.store.health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_store::{BackendKind, MemoryGraphStore, Subgraph};

    struct Canned;

    impl AnswerGenerator for Canned {
        fn answer(&self, _query: &str, subgraph: &Subgraph) -> String {
            format!("{} nodes", subgraph.nodes.len())
        }
    }

    fn service() -> DocGraph {
        DocGraph::new(
            Arc::new(MemoryGraphStore::new()),
            Arc::new(Canned),
            ChunkingConfig::default(),
        )
    }

    #[test]
    fn test_answerer_is_injected() {
        let docgraph = service();
        docgraph
            .ingest_bytes(b"Kubernetes runs here.", OwnerId(1), "k.txt", None)
            .unwrap();
        let result = docgraph.query("Kubernetes", OwnerId(1));
        assert_eq!(result.query, "Kubernetes");
        assert!(result.response.ends_with(" nodes"));
        assert!(!result.graph_data.nodes.is_empty());
    }

    #[test]
    fn test_unknown_document_is_not_found() {
        let docgraph = service();
        let err = docgraph
            .document_graph(&NodeId::from("missing"), OwnerId(1))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_healthcheck_reports_backend() {
        let health = service().healthcheck();
        assert!(health.connected);
        assert_eq!(health.backend, BackendKind::Embedded);
    }
}
