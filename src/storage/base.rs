use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationError(String),
    #[error("Serialization failed: {0}")]
    SerializationError(String),
    #[error("Unsupported feed format: {0}")]
    UnsupportedFormat(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

impl From<csv::Error> for StorageError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            StorageError::OperationError(error.to_string())
        } else {
            StorageError::SerializationError(error.to_string())
        }
    }
}

/// A scraped item that can be written to any feed.
///
/// JSON feeds use the `Serialize` impl as is; CSV feeds need a flat row.
pub trait FeedItem: Serialize + Send + Sync {
    fn csv_header() -> &'static [&'static str]
    where
        Self: Sized;

    fn csv_row(&self) -> Vec<String>;
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn store<T: FeedItem + 'static>(&self, item: &T) -> Result<(), StorageError>;

    async fn flush(&self) -> Result<(), StorageError>;
}
