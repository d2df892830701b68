//! Dropgate Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! crypto primitives (checksum, per-file encryption, token alphabet) shared
//! across all Dropgate components.

pub mod checksum;
pub mod config;
pub mod encryption;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod token;

// Re-export commonly used types
pub use config::Config;
pub use encryption::{EncryptionEngine, FileKey};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
