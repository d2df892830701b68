//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. Backends store opaque ciphertext blobs by path; they never see
//! plaintext and differ only in the physical medium.

use async_trait::async_trait;
use dropgate_core::{AppError, StorageBackend};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store failed: {0}")]
    StoreFailed(String),

    #[error("Retrieve failed: {0}")]
    RetrieveFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(format!("Blob not found: {}", path)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Descriptive metadata attached to a stored blob.
///
/// Backends may persist it alongside the blob (object attributes, sidecar)
/// or ignore it; the authoritative copy lives on the file record.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    pub original_filename: String,
    pub checksum: String,
    pub owner_id: String,
    pub content_type: String,
}

/// Size and content type of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// Storage abstraction trait
///
/// All storage backends (S3-compatible, local filesystem, in-memory) must
/// implement this trait. The ingestion pipeline and download gateway depend
/// solely on this contract.
///
/// `store` is idempotent under retry with the same path: implementations
/// replace on conflict. `retrieve` on a missing path fails with `NotFound`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a blob at `path`, replacing any existing blob there.
    async fn store(&self, path: &str, data: Vec<u8>, metadata: &ObjectMetadata)
        -> StorageResult<()>;

    /// Read the blob at `path`.
    async fn retrieve(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Delete the blob at `path`. Deleting a missing blob is not an error.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Whether a blob exists at `path`.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Size and content type of the blob at `path`.
    async fn info(&self, path: &str) -> StorageResult<ObjectInfo>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
