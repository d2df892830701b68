//! Storage factory for creating backend instances from configuration.

use crate::memory::MemoryStorage;
use crate::traits::{Storage, StorageError, StorageResult};
use dropgate_core::{Config, StorageBackend};
use std::sync::Arc;

/// Create a storage backend instance based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            #[cfg(feature = "storage-s3")]
            {
                let bucket = config.s3_bucket.clone().ok_or_else(|| {
                    StorageError::ConfigError("S3_BUCKET is required for the s3 backend".to_string())
                })?;
                let region = config.s3_region.clone().ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION is required for the s3 backend".to_string())
                })?;

                let storage =
                    crate::s3::S3Storage::new(bucket, region, config.s3_endpoint.clone()).await?;

                tracing::info!(backend = %StorageBackend::S3, "Storage backend initialized");
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "storage-s3"))]
            {
                Err(StorageError::ConfigError(
                    "S3 backend requested but the storage-s3 feature is disabled".to_string(),
                ))
            }
        }
        StorageBackend::Local => {
            #[cfg(feature = "storage-local")]
            {
                let base_path = config.local_storage_path.clone().ok_or_else(|| {
                    StorageError::ConfigError(
                        "LOCAL_STORAGE_PATH is required for the local backend".to_string(),
                    )
                })?;

                let storage = crate::local::LocalStorage::new(base_path.clone()).await?;

                tracing::info!(
                    backend = %StorageBackend::Local,
                    path = %base_path,
                    "Storage backend initialized"
                );
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "storage-local"))]
            {
                Err(StorageError::ConfigError(
                    "Local backend requested but the storage-local feature is disabled"
                        .to_string(),
                ))
            }
        }
        StorageBackend::Memory => {
            tracing::info!(backend = %StorageBackend::Memory, "Storage backend initialized");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
