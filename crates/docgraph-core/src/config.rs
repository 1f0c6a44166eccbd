//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Default target chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between neighbouring chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Paths to all docgraph data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// External graph database directory (`data/graph/`).
    pub graph: PathBuf,
    /// Spooled uploads (`data/uploads/`).
    pub uploads: PathBuf,
    /// Default graph database file (`data/graph/docgraph.db`).
    pub graph_db_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let graph = root.join("graph");
        let paths = Self {
            graph_db_file: graph.join("docgraph.db"),
            uploads: root.join("uploads"),
            graph,
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.graph)?;
        std::fs::create_dir_all(&self.uploads)?;
        Ok(())
    }
}

/// Which graph backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Process-lifetime in-memory graph.
    Embedded,
    /// File-backed graph database, falls back to embedded when unreachable.
    External,
}

impl std::str::FromStr for BackendChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "embedded" | "memory" => Ok(Self::Embedded),
            "external" | "sqlite" => Ok(Self::External),
            other => Err(Error::Config(format!("unknown graph backend: {}", other))),
        }
    }
}

/// Graph store construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendChoice,
    /// Database file used by the external backend.
    pub graph_db_path: PathBuf,
}

impl StoreConfig {
    pub fn embedded() -> Self {
        Self {
            backend: BackendChoice::Embedded,
            graph_db_path: PathBuf::new(),
        }
    }

    pub fn external(graph_db_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendChoice::External,
            graph_db_path: graph_db_path.into(),
        }
    }
}

/// Chunker settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Top-level docgraph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocGraphConfig {
    pub data_paths: DataPaths,
    pub store: StoreConfig,
    pub chunking: ChunkingConfig,
}

impl DocGraphConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let backend = match std::env::var("DOCGRAPH_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => BackendChoice::Embedded,
        };
        let graph_db_path = std::env::var("DOCGRAPH_GRAPH_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_paths.graph_db_file.clone());

        let defaults = ChunkingConfig::default();
        let chunking = ChunkingConfig {
            chunk_size: env_usize("DOCGRAPH_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
            chunk_overlap: env_usize("DOCGRAPH_CHUNK_OVERLAP")?.unwrap_or(defaults.chunk_overlap),
        };

        debug!(
            "Config: backend={:?}, graph_db={}, chunk_size={}, chunk_overlap={}",
            backend,
            graph_db_path.display(),
            chunking.chunk_size,
            chunking.chunk_overlap
        );

        Ok(Self {
            data_paths,
            store: StoreConfig {
                backend,
                graph_db_path,
            },
            chunking,
        })
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be a positive integer, got {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}
