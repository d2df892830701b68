//! Recipient download gateway.
//!
//! Every recipient download passes one gate, checked in a fixed order:
//! transfer exists, recipient exists, not expired, access token matches
//! (constant-time), download limit not reached, files still present. Both
//! download counters move together, exactly once, only after every check
//! has passed.

use chrono::{DateTime, Utc};
use dropgate_core::models::{normalize_email, FileRecord, Transfer, TransferStatus};
use dropgate_core::{AppError, EncryptionEngine};
use dropgate_db::{FileRepository, TransferRepository};
use dropgate_storage::Storage;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::archive::{bundle_zip, sanitize_archive_filename};

/// Assembled content ready to hand to the transport layer.
#[derive(Debug, Clone)]
pub struct DownloadPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct DownloadGateway {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileRepository>,
    transfers: Arc<dyn TransferRepository>,
    encryption: EncryptionEngine,
}

impl DownloadGateway {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRepository>,
        transfers: Arc<dyn TransferRepository>,
    ) -> Self {
        DownloadGateway {
            storage,
            files,
            transfers,
            encryption: EncryptionEngine::new(),
        }
    }

    /// Download a transfer's content as one recipient.
    ///
    /// A single-file transfer is returned as-is; multiple files are bundled
    /// into a zip named after the transfer title.
    pub async fn download(
        &self,
        share_link: &str,
        email: &str,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<DownloadPayload, AppError> {
        let transfer = self
            .transfers
            .find_by_share_link(share_link)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer not found".to_string()))?;

        let recipient = self
            .transfers
            .find_recipient(transfer.id, &normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        if transfer.status == TransferStatus::Expired || transfer.is_expired(now) {
            return Err(AppError::Expired("Transfer has expired".to_string()));
        }
        if transfer.status != TransferStatus::Completed {
            return Err(AppError::NotFound("Transfer not found".to_string()));
        }

        // Constant-time comparison; an attacker probing tokens learns
        // nothing from response timing
        let token_matches: bool = recipient
            .access_token
            .as_bytes()
            .ct_eq(access_token.as_bytes())
            .into();
        if !token_matches {
            tracing::debug!(
                transfer_id = %transfer.id,
                recipient = %recipient.email,
                "Access token mismatch"
            );
            return Err(AppError::InvalidToken);
        }

        if transfer.has_reached_download_limit() {
            return Err(AppError::DownloadLimitReached {
                count: transfer.download_count,
                limit: transfer.download_limit.unwrap_or(0),
            });
        }

        let records = self.resolve_files(&transfer).await?;
        if records.is_empty() {
            return Err(AppError::NotFound(
                "Transfer has no downloadable files".to_string(),
            ));
        }

        self.transfers
            .increment_download_counters(transfer.id, recipient.id)
            .await?;

        let payload = self.assemble_payload(&transfer, records).await?;

        tracing::info!(
            transfer_id = %transfer.id,
            recipient = %recipient.email,
            size_bytes = payload.size_bytes,
            "Transfer downloaded"
        );
        Ok(payload)
    }

    async fn resolve_files(&self, transfer: &Transfer) -> Result<Vec<FileRecord>, AppError> {
        let mut records = Vec::with_capacity(transfer.file_ids.len());
        for file_id in &transfer.file_ids {
            match self.files.find_by_id(*file_id).await? {
                Some(record) if record.is_live() => records.push(record),
                _ => {
                    tracing::warn!(
                        transfer_id = %transfer.id,
                        file_id = %file_id,
                        "Transfer references a missing or deleted file"
                    );
                }
            }
        }
        Ok(records)
    }

    async fn assemble_payload(
        &self,
        transfer: &Transfer,
        records: Vec<FileRecord>,
    ) -> Result<DownloadPayload, AppError> {
        if records.len() == 1 {
            let record = &records[0];
            let plaintext = self.fetch_plaintext(record).await?;
            return Ok(DownloadPayload {
                size_bytes: plaintext.len() as u64,
                filename: record.filename.clone(),
                mime_type: record.mime_type.clone(),
                bytes: plaintext,
            });
        }

        let mut entries = Vec::with_capacity(records.len());
        for record in &records {
            let plaintext = self.fetch_plaintext(record).await?;
            entries.push((record.id, record.filename.clone(), plaintext));
        }

        let bytes = bundle_zip(entries)?;
        let archive_name = format!(
            "{}.zip",
            sanitize_archive_filename(transfer.title.trim(), "transfer")
        );
        Ok(DownloadPayload {
            size_bytes: bytes.len() as u64,
            filename: archive_name,
            mime_type: "application/zip".to_string(),
            bytes,
        })
    }

    async fn fetch_plaintext(&self, record: &FileRecord) -> Result<Vec<u8>, AppError> {
        let ciphertext = self.storage.retrieve(&record.storage_path).await?;
        self.encryption.decrypt(&record.encryption_key, &ciphertext)
    }
}
