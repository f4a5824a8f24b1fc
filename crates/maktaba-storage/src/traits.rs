//! Storage abstraction trait
//!
//! Defines the `Storage` trait the media handlers and repositories work
//! against, keeping them decoupled from the concrete backend.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte stream returned by read operations.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Filesystem-level metadata for a stored object.
#[derive(Debug, Clone, Copy)]
pub struct FileMetadata {
    pub size: u64,
}

/// Storage abstraction trait
///
/// **Key format:** relative paths under the upload root, e.g.
/// `books/{book_id}/{uuid}.pdf` or `videos/{video_id}/{uuid}.mp4`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` at `storage_key`, creating parent directories as needed.
    /// Returns the number of bytes written.
    async fn save(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<u64>;

    /// Delete the object at `storage_key`. Deleting a missing object is not
    /// an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Whether a regular file exists at `storage_key`.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size of the object at `storage_key`. `NotFound` when the key does not
    /// resolve to a regular file.
    async fn stat(&self, storage_key: &str) -> StorageResult<FileMetadata>;

    /// Stream the whole object.
    async fn read_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Stream bytes `start..=end` of the object. Bounds must already be
    /// validated against the object size.
    async fn read_range(&self, storage_key: &str, start: u64, end: u64)
        -> StorageResult<ByteStream>;
}
