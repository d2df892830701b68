//! Domain models.
//!
//! Plain data records with explicit repositories behind them; no
//! lazy-loaded relations. File records reference storage by opaque path,
//! transfers reference files by id, recipients belong to exactly one
//! transfer.

pub mod file_record;
pub mod quota;
pub mod transfer;

pub use file_record::{FileRecord, FileRecordView, UploadStatus};
pub use quota::{PlanType, QuotaUsage};
pub use transfer::{normalize_email, Recipient, Transfer, TransferStatus, TransferView};
