pub mod base;
pub mod disk;
pub mod factory;
pub mod memory;

pub use base::{FeedItem, StorageBackend, StorageError};
pub use disk::{DiskStorage, FeedFormat};
pub use factory::{create_storage, Storage, StorageType};
pub use memory::MemoryStorage;

#[cfg(test)]
mod tests;
