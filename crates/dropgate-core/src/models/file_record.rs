use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encryption::FileKey;

/// Upload lifecycle status of a file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Failed,
    /// Logical reference to an already-stored blob with the same checksum.
    Deduplicated,
}

/// A logical file owned by one account.
///
/// Several live records may share one physical blob (same `checksum`,
/// `storage_path`, and `encryption_key`); each is independently owned,
/// independently charged against its owner's quota, and independently
/// soft-deletable. The encryption key never appears in API views.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the plaintext; dedup key.
    pub checksum: String,
    /// Opaque locator into a storage backend.
    pub storage_path: String,
    pub encryption_key: FileKey,
    pub status: UploadStatus,
    /// Placeholder flag; scanning itself is an external concern.
    pub virus_scanned: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// True for records that still count: not soft-deleted and successfully stored.
    pub fn is_live(&self) -> bool {
        !self.is_deleted
            && matches!(
                self.status,
                UploadStatus::Completed | UploadStatus::Deduplicated
            )
    }

    /// Build a deduplicated reference to an existing record for a new owner.
    ///
    /// Shares the physical blob (path, key, checksum, size) but is an
    /// independent logical file.
    pub fn reference_of(
        existing: &FileRecord,
        owner_id: Uuid,
        filename: String,
        now: DateTime<Utc>,
    ) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            owner_id,
            filename,
            mime_type: existing.mime_type.clone(),
            size_bytes: existing.size_bytes,
            checksum: existing.checksum.clone(),
            storage_path: existing.storage_path.clone(),
            encryption_key: existing.encryption_key.clone(),
            status: UploadStatus::Deduplicated,
            virus_scanned: existing.virus_scanned,
            is_deleted: false,
            created_at: now,
            deleted_at: None,
        }
    }
}

/// External view of a file record; excludes storage path and key.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecordView {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub status: UploadStatus,
}

impl From<&FileRecord> for FileRecordView {
    fn from(record: &FileRecord) -> Self {
        FileRecordView {
            id: record.id,
            filename: record.filename.clone(),
            size_bytes: record.size_bytes,
            checksum: record.checksum.clone(),
            status: record.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::EncryptionEngine;

    fn sample_record() -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            filename: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 1024,
            checksum: "ab".repeat(32),
            storage_path: "files/owner/report.pdf-1a2b3c4d.enc".to_string(),
            encryption_key: EncryptionEngine::new().generate_key().unwrap(),
            status: UploadStatus::Completed,
            virus_scanned: false,
            is_deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_is_live() {
        let mut record = sample_record();
        assert!(record.is_live());

        record.is_deleted = true;
        assert!(!record.is_live());

        record.is_deleted = false;
        record.status = UploadStatus::Failed;
        assert!(!record.is_live());
    }

    #[test]
    fn test_reference_shares_blob_but_not_identity() {
        let original = sample_record();
        let new_owner = Uuid::new_v4();
        let reference =
            FileRecord::reference_of(&original, new_owner, "copy.pdf".to_string(), Utc::now());

        assert_ne!(reference.id, original.id);
        assert_eq!(reference.owner_id, new_owner);
        assert_eq!(reference.checksum, original.checksum);
        assert_eq!(reference.storage_path, original.storage_path);
        assert_eq!(reference.encryption_key, original.encryption_key);
        assert_eq!(reference.status, UploadStatus::Deduplicated);
        assert!(reference.is_live());
    }

    #[test]
    fn test_view_excludes_secrets() {
        let record = sample_record();
        let view = FileRecordView::from(&record);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("storage_path"));
        assert!(!json.contains("encryption_key"));
        assert!(json.contains("checksum"));
    }
}
