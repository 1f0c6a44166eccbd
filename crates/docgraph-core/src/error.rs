//! Error types for docgraph.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// File content could not be read or parsed as its declared format.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The external graph database could not be reached.
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// A relationship referenced an endpoint that does not exist for its owner.
    #[error("Nodes not found: source={source_id}, target={target_id}")]
    NodesNotFound { source_id: String, target_id: String },

    #[error("Failed to create document node: {0}")]
    DocumentCreationFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn nodes_not_found(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::NodesNotFound {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
