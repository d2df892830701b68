//! File ingestion pipeline.
//!
//! One entry point per file: quota precheck, plaintext checksum, dedup
//! lookup, then either the reference path (share an existing blob) or the
//! canonical path (encrypt under a fresh key and write a new blob). Quota
//! is charged only after the content is confirmed stored or deduplicated,
//! and the charge is the actual byte count, not the client-declared size.

use chrono::Utc;
use dropgate_core::checksum::sha256_hex;
use dropgate_core::models::{FileRecord, QuotaUsage, UploadStatus};
use dropgate_core::{AppError, EncryptionEngine};
use dropgate_db::{CanonicalInsert, FileRepository, QuotaLedger};
use dropgate_storage::keys::{file_storage_path, random_suffix};
use dropgate_storage::{ObjectMetadata, Storage};
use std::sync::Arc;
use uuid::Uuid;

/// Request to ingest one file for one owner.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    /// Client-declared size, used only for the early quota precheck.
    pub declared_size_bytes: u64,
    /// Source address, carried into the audit log only.
    pub client_ip: Option<String>,
}

#[derive(Clone)]
pub struct IngestionPipeline {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileRepository>,
    quota: Arc<dyn QuotaLedger>,
    encryption: EncryptionEngine,
}

impl IngestionPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRepository>,
        quota: Arc<dyn QuotaLedger>,
    ) -> Self {
        IngestionPipeline {
            storage,
            files,
            quota,
            encryption: EncryptionEngine::new(),
        }
    }

    /// Ingest one file and return its record.
    ///
    /// Identical content already live anywhere in the system is not stored
    /// again: the new record references the existing blob with status
    /// `Deduplicated`, and the owner is still charged its full size.
    pub async fn ingest(&self, request: UploadRequest, data: Vec<u8>) -> Result<FileRecord, AppError> {
        if request.filename.trim().is_empty() {
            return Err(AppError::Validation("Filename must not be empty".to_string()));
        }

        let start = std::time::Instant::now();

        // Early rejection on the declared size, before hashing or encrypting.
        // The authoritative check is the reserve below.
        if !self
            .quota
            .has_available(request.owner_id, request.declared_size_bytes)
            .await?
        {
            let usage = self.quota.usage(request.owner_id).await?;
            return Err(AppError::QuotaExceeded {
                required: request.declared_size_bytes,
                available: usage.available_bytes(),
            });
        }

        let actual_size = data.len() as u64;
        let checksum = sha256_hex(&data);

        if let Some(existing) = self.files.find_live_by_checksum(&checksum).await? {
            return self.ingest_as_reference(&request, &existing, actual_size).await;
        }

        let key = self.encryption.generate_key()?;
        let ciphertext = self.encryption.encrypt(&key, &data)?;
        let storage_path = file_storage_path(request.owner_id, &request.filename, &random_suffix());

        let metadata = ObjectMetadata {
            original_filename: request.filename.clone(),
            checksum: checksum.clone(),
            owner_id: request.owner_id.to_string(),
            content_type: request.mime_type.clone(),
        };
        self.storage.store(&storage_path, ciphertext, &metadata).await?;

        let record = FileRecord {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            filename: request.filename.clone(),
            mime_type: request.mime_type.clone(),
            size_bytes: actual_size,
            checksum: checksum.clone(),
            storage_path: storage_path.clone(),
            encryption_key: key,
            status: UploadStatus::Completed,
            virus_scanned: false,
            is_deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        };

        match self.files.insert_canonical(record).await? {
            CanonicalInsert::Inserted(record) => {
                if let Err(err) = self.quota.reserve(request.owner_id, actual_size).await {
                    // Undo the write so a rejected upload leaves no trace
                    let _ = self.files.soft_delete(record.id, record.owner_id, Utc::now()).await;
                    if let Err(delete_err) = self.storage.delete(&storage_path).await {
                        tracing::warn!(
                            storage_path = %storage_path,
                            error = %delete_err,
                            "Failed to remove blob after quota rejection"
                        );
                    }
                    return Err(err);
                }

                tracing::info!(
                    file_id = %record.id,
                    owner_id = %request.owner_id,
                    size_bytes = actual_size,
                    checksum = %checksum,
                    client_ip = request.client_ip.as_deref().unwrap_or("unknown"),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "File ingested"
                );
                Ok(record)
            }
            CanonicalInsert::Duplicate(existing) => {
                // A concurrent upload of the same content won the checksum
                // slot; our blob is redundant.
                if let Err(delete_err) = self.storage.delete(&storage_path).await {
                    tracing::warn!(
                        storage_path = %storage_path,
                        error = %delete_err,
                        "Failed to remove redundant blob after losing dedup race"
                    );
                }
                self.ingest_as_reference(&request, &existing, actual_size).await
            }
        }
    }

    async fn ingest_as_reference(
        &self,
        request: &UploadRequest,
        existing: &FileRecord,
        actual_size: u64,
    ) -> Result<FileRecord, AppError> {
        self.quota.reserve(request.owner_id, actual_size).await?;

        let reference = FileRecord::reference_of(
            existing,
            request.owner_id,
            request.filename.clone(),
            Utc::now(),
        );
        let record = match self.files.insert_reference(reference).await {
            Ok(record) => record,
            Err(err) => {
                self.quota.release(request.owner_id, actual_size).await?;
                return Err(err);
            }
        };

        tracing::info!(
            file_id = %record.id,
            owner_id = %request.owner_id,
            canonical_id = %existing.id,
            size_bytes = actual_size,
            checksum = %record.checksum,
            "File deduplicated against existing content"
        );
        Ok(record)
    }

    /// Fetch and decrypt a file for its owner.
    pub async fn download_own_file(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> Result<(FileRecord, Vec<u8>), AppError> {
        let record = self
            .files
            .find_live_owned(file_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File not found: {}", file_id)))?;

        let ciphertext = self.storage.retrieve(&record.storage_path).await?;
        let plaintext = self.encryption.decrypt(&record.encryption_key, &ciphertext)?;
        Ok((record, plaintext))
    }

    /// Soft-delete an owned file and release its quota charge.
    ///
    /// The blob itself stays: other records may reference it, and reference
    /// counting across owners is a reclamation job outside this pipeline.
    pub async fn delete_file(&self, owner_id: Uuid, file_id: Uuid) -> Result<(), AppError> {
        let deleted = self.files.soft_delete(file_id, owner_id, Utc::now()).await?;
        self.quota.release(owner_id, deleted.size_bytes).await?;

        tracing::info!(
            file_id = %file_id,
            owner_id = %owner_id,
            released_bytes = deleted.size_bytes,
            "File deleted"
        );
        Ok(())
    }

    pub async fn list_files(&self, owner_id: Uuid) -> Result<Vec<FileRecord>, AppError> {
        self.files.list_live_by_owner(owner_id).await
    }

    pub async fn quota_usage(&self, owner_id: Uuid) -> Result<QuotaUsage, AppError> {
        self.quota.usage(owner_id).await
    }
}
