//! File record repository
//!
//! Owns the logical file records and the checksum index used for
//! content-addressable deduplication. The canonical insert is the single
//! point where two concurrent uploads of identical content get serialized:
//! exactly one caller wins the checksum slot, the other gets the winner's
//! record back and reroutes to the reference path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dropgate_core::models::FileRecord;
use dropgate_core::AppError;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Outcome of attempting to insert a canonical (physically stored) record.
#[derive(Debug, Clone)]
pub enum CanonicalInsert {
    /// No live record with this checksum existed; the new record is canonical.
    Inserted(FileRecord),
    /// A live record with this checksum already exists. The caller's blob
    /// write was redundant and the caller should reference this record.
    Duplicate(FileRecord),
}

/// Repository for file records.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record for freshly stored content, unless a live record with
    /// the same checksum already exists. Atomic: of two concurrent callers
    /// with equal checksums, exactly one gets `Inserted`.
    async fn insert_canonical(&self, record: FileRecord) -> Result<CanonicalInsert, AppError>;

    /// Insert a deduplicated reference record. No checksum uniqueness check;
    /// references deliberately share a checksum with their canonical record.
    async fn insert_reference(&self, record: FileRecord) -> Result<FileRecord, AppError>;

    /// Find any live record holding this checksum.
    async fn find_live_by_checksum(&self, checksum: &str)
        -> Result<Option<FileRecord>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Find a live record by id, visible only to its owner.
    async fn find_live_owned(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Soft-delete an owned live record, returning it as it was before the
    /// delete so the caller can release its quota charge.
    async fn soft_delete(
        &self,
        id: Uuid,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FileRecord, AppError>;

    async fn list_live_by_owner(&self, owner_id: Uuid) -> Result<Vec<FileRecord>, AppError>;
}

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, FileRecord>,
    /// checksum -> every record id ever inserted with it, canonical first.
    checksum_index: HashMap<String, Vec<Uuid>>,
}

impl Inner {
    fn live_by_checksum(&self, checksum: &str) -> Option<&FileRecord> {
        self.checksum_index
            .get(checksum)?
            .iter()
            .filter_map(|id| self.records.get(id))
            .find(|record| record.is_live())
    }

    fn insert(&mut self, record: FileRecord) {
        self.checksum_index
            .entry(record.checksum.clone())
            .or_default()
            .push(record.id);
        self.records.insert(record.id, record);
    }
}

/// In-memory file repository backed by id-indexed maps.
#[derive(Default)]
pub struct InMemoryFileRepository {
    inner: RwLock<Inner>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert_canonical(&self, record: FileRecord) -> Result<CanonicalInsert, AppError> {
        let mut inner = self.inner.write().expect("file repository lock poisoned");

        if let Some(existing) = inner.live_by_checksum(&record.checksum) {
            tracing::debug!(
                checksum = %record.checksum,
                existing_id = %existing.id,
                "Canonical insert lost to an existing record"
            );
            return Ok(CanonicalInsert::Duplicate(existing.clone()));
        }

        let inserted = record.clone();
        inner.insert(record);
        Ok(CanonicalInsert::Inserted(inserted))
    }

    async fn insert_reference(&self, record: FileRecord) -> Result<FileRecord, AppError> {
        let mut inner = self.inner.write().expect("file repository lock poisoned");
        let inserted = record.clone();
        inner.insert(record);
        Ok(inserted)
    }

    async fn find_live_by_checksum(
        &self,
        checksum: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let inner = self.inner.read().expect("file repository lock poisoned");
        Ok(inner.live_by_checksum(checksum).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let inner = self.inner.read().expect("file repository lock poisoned");
        Ok(inner.records.get(&id).cloned())
    }

    async fn find_live_owned(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        let inner = self.inner.read().expect("file repository lock poisoned");
        Ok(inner
            .records
            .get(&id)
            .filter(|record| record.owner_id == owner_id && record.is_live())
            .cloned())
    }

    async fn soft_delete(
        &self,
        id: Uuid,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FileRecord, AppError> {
        let mut inner = self.inner.write().expect("file repository lock poisoned");

        let record = inner
            .records
            .get_mut(&id)
            .filter(|record| record.owner_id == owner_id && record.is_live())
            .ok_or_else(|| AppError::NotFound(format!("File not found: {}", id)))?;

        let before = record.clone();
        record.is_deleted = true;
        record.deleted_at = Some(now);
        Ok(before)
    }

    async fn list_live_by_owner(&self, owner_id: Uuid) -> Result<Vec<FileRecord>, AppError> {
        let inner = self.inner.read().expect("file repository lock poisoned");
        let mut records: Vec<FileRecord> = inner
            .records
            .values()
            .filter(|record| record.owner_id == owner_id && record.is_live())
            .cloned()
            .collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }
}
