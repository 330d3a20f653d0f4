//! Object storage backends for asset bytes.

pub mod demo;
pub mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use demo::DemoStorage;
pub use filesystem::FilesystemStorage;

/// Object storage backend trait. Asset bytes at a given key are treated as
/// immutable once written.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store content under the given key
    async fn put(&self, key: &str, content: Bytes) -> Result<()>;

    /// Retrieve content by key
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool>;
}
