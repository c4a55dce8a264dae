use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DocumentStore, StoreError};
use crate::models::resume::Collection;

/// In-memory store for tests. Same whole-collection contract as [`super::FileStore`].
#[derive(Default)]
pub struct MemoryStore {
    collection: Mutex<Collection>,
    simulate_write_error: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(collection: Collection) -> Self {
        Self {
            collection: Mutex::new(collection),
            simulate_write_error: AtomicBool::new(false),
        }
    }

    /// Makes subsequent writes fail, for exercising the store-error path.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self) -> Collection {
        self.collection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn write(&self, collection: &Collection) -> Result<(), StoreError> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".to_string()));
        }
        *self
            .collection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = collection.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_write_error_keeps_previous_state() {
        let store = MemoryStore::new();
        store.set_simulate_write_error(true);
        assert!(store.write(&Vec::new()).await.is_err());
        store.set_simulate_write_error(false);
        assert!(store.write(&Vec::new()).await.is_ok());
        assert!(store.read().await.is_empty());
    }
}
