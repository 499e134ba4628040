use super::base::{FeedItem, StorageBackend, StorageError};
use super::disk::FeedFormat;
use super::{DiskStorage, MemoryStorage};
use async_trait::async_trait;
use std::path::PathBuf;

pub enum StorageType {
    Disk { path: PathBuf, format: FeedFormat },
    Memory,
}

impl StorageType {
    /// A disk feed whose format follows the file extension.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let path = path.into();
        let format = FeedFormat::from_path(&path)?;
        Ok(StorageType::Disk { path, format })
    }
}

#[derive(Clone)]
pub enum Storage {
    Disk(std::sync::Arc<DiskStorage>),
    Memory(MemoryStorage),
}

#[async_trait]
impl StorageBackend for Storage {
    async fn store<T: FeedItem + 'static>(&self, item: &T) -> Result<(), StorageError> {
        match self {
            Storage::Disk(storage) => storage.store(item).await,
            Storage::Memory(storage) => storage.store(item).await,
        }
    }

    async fn flush(&self) -> Result<(), StorageError> {
        match self {
            Storage::Disk(storage) => storage.flush().await,
            Storage::Memory(storage) => storage.flush().await,
        }
    }
}

pub fn create_storage(storage_type: StorageType) -> Result<Storage, StorageError> {
    match storage_type {
        StorageType::Disk { path, format } => Ok(Storage::Disk(std::sync::Arc::new(
            DiskStorage::new(path, format)?,
        ))),
        StorageType::Memory => Ok(Storage::Memory(MemoryStorage::new())),
    }
}
