use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfer lifecycle status.
///
/// PENDING -> COMPLETED | FAILED; COMPLETED -> EXPIRED via the sweep; any
/// non-terminal state -> CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Uploading,
    Completed,
    Expired,
    Cancelled,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Expired | TransferStatus::Cancelled | TransferStatus::Failed
        )
    }
}

/// A named bundle of files shared with one or more recipients under
/// expiry/limit constraints.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub message: Option<String>,
    /// Fixed-length public token identifying the transfer; not secret by itself.
    pub share_link: String,
    pub status: TransferStatus,
    pub total_size_bytes: u64,
    pub download_limit: Option<u32>,
    pub download_count: u32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ordered set of linked file record ids.
    pub file_ids: Vec<Uuid>,
}

impl Transfer {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn has_reached_download_limit(&self) -> bool {
        match self.download_limit {
            Some(limit) => self.download_count >= limit,
            None => false,
        }
    }
}

/// One addressee of a transfer, holding its own access token and download
/// counter. Owned by exactly one transfer (cascade on destroy).
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: Uuid,
    pub transfer_id: Uuid,
    /// Normalized lower-case address.
    pub email: String,
    /// Secret required alongside the share link and email; globally unique.
    pub access_token: String,
    pub download_count: u32,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Normalize a recipient email for lookup and de-duplication.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// External view of a transfer; excludes access tokens.
#[derive(Debug, Clone, Serialize)]
pub struct TransferView {
    pub id: Uuid,
    pub share_link: String,
    pub status: TransferStatus,
    pub total_size_bytes: u64,
    pub expires_at: DateTime<Utc>,
    pub file_names: Vec<String>,
    pub recipient_emails: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_transfer() -> Transfer {
        let now = Utc::now();
        Transfer {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Quarterly report".to_string(),
            message: None,
            share_link: "abcdefgh23456789".to_string(),
            status: TransferStatus::Completed,
            total_size_bytes: 2048,
            download_limit: None,
            download_count: 0,
            expires_at: now + Duration::days(7),
            created_at: now,
            completed_at: Some(now),
            file_ids: vec![Uuid::new_v4()],
        }
    }

    #[test]
    fn test_expiry() {
        let transfer = sample_transfer();
        assert!(!transfer.is_expired(Utc::now()));
        assert!(transfer.is_expired(transfer.expires_at + Duration::seconds(1)));
        // Boundary: exactly at expires_at is still valid
        assert!(!transfer.is_expired(transfer.expires_at));
    }

    #[test]
    fn test_download_limit() {
        let mut transfer = sample_transfer();
        assert!(!transfer.has_reached_download_limit());

        transfer.download_limit = Some(2);
        assert!(!transfer.has_reached_download_limit());
        transfer.download_count = 2;
        assert!(transfer.has_reached_download_limit());
        transfer.download_count = 3;
        assert!(transfer.has_reached_download_limit());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Expired.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }
}
