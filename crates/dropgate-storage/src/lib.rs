//! Dropgate Storage Library
//!
//! This crate provides the storage abstraction and implementations for
//! Dropgate: local filesystem, S3-compatible object stores, and an
//! in-memory backend for tests and development.
//!
//! # Storage path format
//!
//! Blobs are stored under `files/{owner_id}/{sanitized_filename}-{suffix}.enc`.
//! The suffix makes paths unique when one owner uploads the same filename
//! twice; path generation is centralized in the `keys` module so all
//! backends stay consistent. Paths must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use dropgate_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectInfo, ObjectMetadata, Storage, StorageError, StorageResult};
