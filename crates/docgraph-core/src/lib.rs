//! docgraph core: error taxonomy and configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{BackendChoice, ChunkingConfig, DataPaths, DocGraphConfig, StoreConfig};
pub use error::{Error, Result};
