//! Transfer repository
//!
//! Owns transfers and their recipients, plus the share-link and access-token
//! uniqueness sets the token issuer probes. The paired download counter bump
//! (transfer plus recipient) is one atomic mutation so the two counters can
//! never drift apart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dropgate_core::models::{Recipient, Transfer, TransferStatus};
use dropgate_core::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

/// Repository for transfers and recipients.
#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// Insert a new transfer. Fails with `Validation` if the share link is
    /// already taken.
    async fn insert(&self, transfer: Transfer) -> Result<Transfer, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, AppError>;

    async fn find_by_share_link(&self, share_link: &str) -> Result<Option<Transfer>, AppError>;

    async fn share_link_exists(&self, share_link: &str) -> Result<bool, AppError>;

    async fn access_token_exists(&self, access_token: &str) -> Result<bool, AppError>;

    /// Insert a recipient. Fails with `Validation` if the access token is
    /// already taken.
    async fn insert_recipient(&self, recipient: Recipient) -> Result<Recipient, AppError>;

    /// Recipients of a transfer in insertion order.
    async fn recipients_of(&self, transfer_id: Uuid) -> Result<Vec<Recipient>, AppError>;

    /// Find a recipient of a transfer by normalized email.
    async fn find_recipient(
        &self,
        transfer_id: Uuid,
        email: &str,
    ) -> Result<Option<Recipient>, AppError>;

    async fn mark_notified(&self, recipient_id: Uuid, now: DateTime<Utc>)
        -> Result<(), AppError>;

    /// Bump the transfer's and the recipient's download counters together.
    async fn increment_download_counters(
        &self,
        transfer_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<(), AppError>;

    /// Mark a transfer completed, stamping `completed_at`.
    async fn complete(&self, id: Uuid, now: DateTime<Utc>) -> Result<Transfer, AppError>;

    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError>;

    /// Cancel an owned, non-terminal transfer.
    async fn cancel(&self, id: Uuid, owner_id: Uuid) -> Result<Transfer, AppError>;

    /// Flip every non-terminal transfer whose expiry has passed to
    /// `Expired`. Returns how many were flipped.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError>;

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Transfer>, AppError>;
}

#[derive(Default)]
struct Inner {
    transfers: HashMap<Uuid, Transfer>,
    recipients: HashMap<Uuid, Recipient>,
    recipients_by_transfer: HashMap<Uuid, Vec<Uuid>>,
    by_share_link: HashMap<String, Uuid>,
    access_tokens: HashSet<String>,
}

/// In-memory transfer repository backed by id-indexed maps.
#[derive(Default)]
pub struct InMemoryTransferRepository {
    inner: RwLock<Inner>,
}

impl InMemoryTransferRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferRepository for InMemoryTransferRepository {
    async fn insert(&self, transfer: Transfer) -> Result<Transfer, AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");

        if inner.by_share_link.contains_key(&transfer.share_link) {
            return Err(AppError::Validation(format!(
                "Share link already taken: {}",
                transfer.share_link
            )));
        }

        inner
            .by_share_link
            .insert(transfer.share_link.clone(), transfer.id);
        let inserted = transfer.clone();
        inner.transfers.insert(transfer.id, transfer);
        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        Ok(inner.transfers.get(&id).cloned())
    }

    async fn find_by_share_link(&self, share_link: &str) -> Result<Option<Transfer>, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        Ok(inner
            .by_share_link
            .get(share_link)
            .and_then(|id| inner.transfers.get(id))
            .cloned())
    }

    async fn share_link_exists(&self, share_link: &str) -> Result<bool, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        Ok(inner.by_share_link.contains_key(share_link))
    }

    async fn access_token_exists(&self, access_token: &str) -> Result<bool, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        Ok(inner.access_tokens.contains(access_token))
    }

    async fn insert_recipient(&self, recipient: Recipient) -> Result<Recipient, AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");

        if inner.access_tokens.contains(&recipient.access_token) {
            return Err(AppError::Validation(
                "Access token already taken".to_string(),
            ));
        }

        inner.access_tokens.insert(recipient.access_token.clone());
        inner
            .recipients_by_transfer
            .entry(recipient.transfer_id)
            .or_default()
            .push(recipient.id);
        let inserted = recipient.clone();
        inner.recipients.insert(recipient.id, recipient);
        Ok(inserted)
    }

    async fn recipients_of(&self, transfer_id: Uuid) -> Result<Vec<Recipient>, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        Ok(inner
            .recipients_by_transfer
            .get(&transfer_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.recipients.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_recipient(
        &self,
        transfer_id: Uuid,
        email: &str,
    ) -> Result<Option<Recipient>, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        Ok(inner
            .recipients_by_transfer
            .get(&transfer_id)
            .and_then(|ids| {
                ids.iter()
                    .filter_map(|id| inner.recipients.get(id))
                    .find(|recipient| recipient.email == email)
            })
            .cloned())
    }

    async fn mark_notified(
        &self,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");
        let recipient = inner
            .recipients
            .get_mut(&recipient_id)
            .ok_or_else(|| AppError::NotFound(format!("Recipient not found: {}", recipient_id)))?;
        recipient.notified_at = Some(now);
        Ok(())
    }

    async fn increment_download_counters(
        &self,
        transfer_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");

        // Validate both sides before mutating either
        if !inner.transfers.contains_key(&transfer_id) {
            return Err(AppError::NotFound(format!(
                "Transfer not found: {}",
                transfer_id
            )));
        }
        let recipient = inner
            .recipients
            .get_mut(&recipient_id)
            .filter(|recipient| recipient.transfer_id == transfer_id)
            .ok_or_else(|| AppError::NotFound(format!("Recipient not found: {}", recipient_id)))?;

        recipient.download_count += 1;
        let transfer = inner
            .transfers
            .get_mut(&transfer_id)
            .expect("checked above");
        transfer.download_count += 1;
        Ok(())
    }

    async fn complete(&self, id: Uuid, now: DateTime<Utc>) -> Result<Transfer, AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");
        let transfer = inner
            .transfers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Transfer not found: {}", id)))?;
        transfer.status = TransferStatus::Completed;
        transfer.completed_at = Some(now);
        Ok(transfer.clone())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");
        let transfer = inner
            .transfers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Transfer not found: {}", id)))?;
        transfer.status = TransferStatus::Failed;
        Ok(())
    }

    async fn cancel(&self, id: Uuid, owner_id: Uuid) -> Result<Transfer, AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");
        let transfer = inner
            .transfers
            .get_mut(&id)
            .filter(|transfer| transfer.owner_id == owner_id)
            .ok_or_else(|| AppError::NotFound(format!("Transfer not found: {}", id)))?;

        if transfer.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "Transfer is already in a terminal state: {:?}",
                transfer.status
            )));
        }

        transfer.status = TransferStatus::Cancelled;
        Ok(transfer.clone())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut inner = self.inner.write().expect("transfer repository lock poisoned");
        let mut flipped = 0;
        for transfer in inner.transfers.values_mut() {
            if !transfer.status.is_terminal() && transfer.is_expired(now) {
                transfer.status = TransferStatus::Expired;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Transfer>, AppError> {
        let inner = self.inner.read().expect("transfer repository lock poisoned");
        let mut transfers: Vec<Transfer> = inner
            .transfers
            .values()
            .filter(|transfer| transfer.owner_id == owner_id)
            .cloned()
            .collect();
        transfers.sort_by_key(|transfer| transfer.created_at);
        Ok(transfers)
    }
}
