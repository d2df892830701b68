use crate::traits::{ObjectInfo, ObjectMetadata, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blob storage (e.g., "/var/lib/dropgate/files")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a storage path to a filesystem path with security validation
    ///
    /// Rejects storage paths containing traversal sequences that could
    /// escape the base storage directory.
    fn storage_path_to_fs(&self, storage_path: &str) -> StorageResult<PathBuf> {
        if storage_path.contains("..") || storage_path.starts_with('/') {
            return Err(StorageError::InvalidPath(
                "Storage path contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_path);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidPath(
                    "Storage path resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(
        &self,
        storage_path: &str,
        data: Vec<u8>,
        _metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        let path = self.storage_path_to_fs(storage_path)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        // File::create truncates, giving replace-on-conflict semantics
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::StoreFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::StoreFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::StoreFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            storage_path = %storage_path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage store successful"
        );

        Ok(())
    }

    async fn retrieve(&self, storage_path: &str) -> StorageResult<Vec<u8>> {
        let path = self.storage_path_to_fs(storage_path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_path.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::RetrieveFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            storage_path = %storage_path,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage retrieve successful"
        );

        Ok(data)
    }

    async fn delete(&self, storage_path: &str) -> StorageResult<()> {
        let path = self.storage_path_to_fs(storage_path)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            storage_path = %storage_path,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_path: &str) -> StorageResult<bool> {
        let path = self.storage_path_to_fs(storage_path)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn info(&self, storage_path: &str) -> StorageResult<ObjectInfo> {
        let path = self.storage_path_to_fs(storage_path)?;

        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(storage_path.to_string())
            } else {
                StorageError::BackendError(e.to_string())
            }
        })?;

        Ok(ObjectInfo {
            size_bytes: meta.len(),
            content_type: None,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
