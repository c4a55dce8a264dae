//! Local document store: the durable cache of résumé records.
//!
//! The store is a port so the repository can run against the filesystem in
//! production and against memory in tests. Both implementations share one
//! contract:
//! - `read` never fails; a missing or unreadable collection reads as empty
//! - `write` replaces the whole collection, last successful write wins

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::resume::Collection;

pub mod fs;
#[cfg(test)]
pub mod memory;

pub use fs::FileStore;
#[cfg(test)]
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the full collection, or an empty one if nothing readable is stored.
    async fn read(&self) -> Collection;

    /// Atomically replaces the stored collection.
    async fn write(&self, collection: &Collection) -> Result<(), StoreError>;
}
