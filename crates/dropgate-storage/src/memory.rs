//! In-memory storage backend.
//!
//! Used by tests and local development. Tracks how many physical writes
//! happened, which lets tests assert the dedup property (a second upload of
//! identical bytes must not write a second blob).

use crate::traits::{ObjectInfo, ObjectMetadata, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
}

/// In-memory storage implementation
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    write_count: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn object_count(&self) -> usize {
        self.objects.read().expect("storage lock poisoned").len()
    }

    /// Total number of physical writes since creation.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn store(
        &self,
        storage_path: &str,
        data: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        let content_type = if metadata.content_type.is_empty() {
            None
        } else {
            Some(metadata.content_type.clone())
        };

        self.objects.write().expect("storage lock poisoned").insert(
            storage_path.to_string(),
            StoredObject { data, content_type },
        );
        self.write_count.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(storage_path = %storage_path, "Memory storage store successful");
        Ok(())
    }

    async fn retrieve(&self, storage_path: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .expect("storage lock poisoned")
            .get(storage_path)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| StorageError::NotFound(storage_path.to_string()))
    }

    async fn delete(&self, storage_path: &str) -> StorageResult<()> {
        self.objects
            .write()
            .expect("storage lock poisoned")
            .remove(storage_path);
        Ok(())
    }

    async fn exists(&self, storage_path: &str) -> StorageResult<bool> {
        Ok(self
            .objects
            .read()
            .expect("storage lock poisoned")
            .contains_key(storage_path))
    }

    async fn info(&self, storage_path: &str) -> StorageResult<ObjectInfo> {
        self.objects
            .read()
            .expect("storage lock poisoned")
            .get(storage_path)
            .map(|obj| ObjectInfo {
                size_bytes: obj.data.len() as u64,
                content_type: obj.content_type.clone(),
            })
            .ok_or_else(|| StorageError::NotFound(storage_path.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
