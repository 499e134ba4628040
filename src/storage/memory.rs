use super::base::{FeedItem, StorageBackend, StorageError};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Keeps items in memory as JSON values. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<Vec<Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn items<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        self.items
            .read()
            .iter()
            .map(|value| serde_json::from_value(value.clone()).map_err(StorageError::from))
            .collect()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn store<T: FeedItem + 'static>(&self, item: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(item)?;
        self.items.write().push(value);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
