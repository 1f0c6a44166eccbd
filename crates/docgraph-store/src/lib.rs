//! docgraph store: owner-scoped property graph with embedded and external backends.

pub mod graph;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

use std::sync::Arc;

use tracing::{info, warn};

use docgraph_core::{BackendChoice, StoreConfig};

pub use graph::{build_overview, rel, GraphStore};
pub use memory::MemoryGraphStore;
pub use sqlite::SqliteGraphStore;
pub use types::*;

/// Build the configured backend.
///
/// An external backend that cannot be opened or fails its connectivity
/// check is replaced by the embedded one, so the caller always gets a store.
pub fn open_store(config: &StoreConfig) -> Arc<dyn GraphStore> {
    match config.backend {
        BackendChoice::Embedded => {
            info!("Using embedded graph store");
            Arc::new(MemoryGraphStore::new())
        }
        BackendChoice::External => match SqliteGraphStore::open(&config.graph_db_path) {
            Ok(store) => {
                info!(
                    "Using external graph store at {}",
                    config.graph_db_path.display()
                );
                Arc::new(store)
            }
            Err(e) => {
                warn!(
                    "External graph store unavailable ({}), falling back to embedded store",
                    e
                );
                Arc::new(MemoryGraphStore::new())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_embedded() {
        let store = open_store(&StoreConfig::embedded());
        assert_eq!(store.backend(), BackendKind::Embedded);
        assert!(store.health().connected);
    }

    #[test]
    fn test_open_store_external() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&StoreConfig::external(dir.path().join("docgraph.db")));
        assert_eq!(store.backend(), BackendKind::External);
    }

    #[test]
    fn test_unreachable_external_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = open_store(&StoreConfig::external(blocker.join("graph").join("docgraph.db")));
        assert_eq!(store.backend(), BackendKind::Embedded);
    }
}
