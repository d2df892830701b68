//! Transfer creation and lifecycle.
//!
//! A transfer bundles previously ingested files for a set of recipients
//! under a share link, an expiry, and an optional download limit. Creation
//! is tolerant of stale file ids (skipped with a warning) and treats
//! notification as best-effort: a failed email never fails the transfer.

use chrono::{DateTime, Duration, Utc};
use dropgate_core::models::{
    normalize_email, Recipient, Transfer, TransferStatus, TransferView,
};
use dropgate_core::{AppError, Config};
use dropgate_db::{FileRepository, TransferRepository};
use std::sync::Arc;
use uuid::Uuid;

use crate::notify::{Notifier, TransferNotification};
use crate::tokens::ShareTokenIssuer;

/// Request to create a transfer from already-ingested files.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub owner_id: Uuid,
    pub title: String,
    pub message: Option<String>,
    pub file_ids: Vec<Uuid>,
    pub recipient_emails: Vec<String>,
    pub download_limit: Option<u32>,
    /// Days until expiry; falls back to the configured default.
    pub expires_in_days: Option<i64>,
}

#[derive(Clone)]
pub struct TransferManager {
    files: Arc<dyn FileRepository>,
    transfers: Arc<dyn TransferRepository>,
    notifier: Arc<dyn Notifier>,
    token_issuer: ShareTokenIssuer,
    base_url: String,
    default_expiry_days: i64,
}

impl TransferManager {
    pub fn new(
        files: Arc<dyn FileRepository>,
        transfers: Arc<dyn TransferRepository>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        let token_issuer = ShareTokenIssuer::new(transfers.clone(), config.access_token_length);
        TransferManager {
            files,
            transfers,
            notifier,
            token_issuer,
            base_url: config.base_url.clone(),
            default_expiry_days: config.default_expiry_days,
        }
    }

    /// Create a transfer, issue its tokens, and notify the recipients.
    ///
    /// File ids that do not resolve to a live file owned by the caller are
    /// skipped; at least one must survive. Recipient emails are normalized
    /// and de-duplicated before tokens are issued.
    pub async fn create_transfer(&self, new: NewTransfer) -> Result<Transfer, AppError> {
        if new.title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        if let Some(0) = new.download_limit {
            return Err(AppError::Validation(
                "Download limit must be at least 1".to_string(),
            ));
        }

        let mut emails: Vec<String> = Vec::new();
        for raw in &new.recipient_emails {
            let email = normalize_email(raw);
            if email.is_empty() || !email.contains('@') {
                return Err(AppError::Validation(format!(
                    "Invalid recipient email: {}",
                    raw
                )));
            }
            if !emails.contains(&email) {
                emails.push(email);
            }
        }
        if emails.is_empty() {
            return Err(AppError::Validation(
                "At least one recipient is required".to_string(),
            ));
        }

        let mut resolved = Vec::new();
        for file_id in &new.file_ids {
            match self.files.find_live_owned(*file_id, new.owner_id).await? {
                Some(record) => resolved.push(record),
                None => {
                    tracing::warn!(
                        file_id = %file_id,
                        owner_id = %new.owner_id,
                        "Skipping unknown or deleted file in transfer"
                    );
                }
            }
        }
        if resolved.is_empty() {
            return Err(AppError::Validation(
                "Transfer needs at least one valid file".to_string(),
            ));
        }

        let total_size_bytes = resolved.iter().map(|record| record.size_bytes).sum();
        let share_link = self.token_issuer.issue_share_link().await?;
        let now = Utc::now();
        let expiry_days = new.expires_in_days.unwrap_or(self.default_expiry_days);
        if expiry_days <= 0 {
            return Err(AppError::Validation(
                "Expiry must be in the future".to_string(),
            ));
        }

        let transfer = self
            .transfers
            .insert(Transfer {
                id: Uuid::new_v4(),
                owner_id: new.owner_id,
                title: new.title.clone(),
                message: new.message.clone(),
                share_link: share_link.clone(),
                status: TransferStatus::Pending,
                total_size_bytes,
                download_limit: new.download_limit,
                download_count: 0,
                expires_at: now + Duration::days(expiry_days),
                created_at: now,
                completed_at: None,
                file_ids: resolved.iter().map(|record| record.id).collect(),
            })
            .await?;

        let mut recipients = Vec::with_capacity(emails.len());
        for email in emails {
            let recipient = match self.add_recipient(&transfer, email).await {
                Ok(recipient) => recipient,
                Err(err) => {
                    self.transfers.mark_failed(transfer.id).await?;
                    return Err(err);
                }
            };
            recipients.push(recipient);
        }

        let transfer = self.transfers.complete(transfer.id, Utc::now()).await?;

        for recipient in &recipients {
            self.notify_recipient(&transfer, recipient, resolved.len()).await;
        }

        tracing::info!(
            transfer_id = %transfer.id,
            share_link = %transfer.share_link,
            file_count = resolved.len(),
            recipient_count = recipients.len(),
            total_size_bytes = total_size_bytes,
            "Transfer created"
        );
        Ok(transfer)
    }

    async fn add_recipient(
        &self,
        transfer: &Transfer,
        email: String,
    ) -> Result<Recipient, AppError> {
        let access_token = self.token_issuer.issue_access_token().await?;
        self.transfers
            .insert_recipient(Recipient {
                id: Uuid::new_v4(),
                transfer_id: transfer.id,
                email,
                access_token,
                download_count: 0,
                notified_at: None,
                created_at: Utc::now(),
            })
            .await
    }

    /// Send the notification for one recipient. Failures are logged, never
    /// propagated; `notified_at` is stamped only on success.
    async fn notify_recipient(&self, transfer: &Transfer, recipient: &Recipient, file_count: usize) {
        let notification = TransferNotification {
            recipient_email: recipient.email.clone(),
            transfer_title: transfer.title.clone(),
            sender_message: transfer.message.clone(),
            download_url: self.download_url(transfer, recipient),
            file_count,
            total_size_bytes: transfer.total_size_bytes,
            expires_at: transfer.expires_at,
        };

        match self.notifier.notify(&notification).await {
            Ok(()) => {
                if let Err(err) = self
                    .transfers
                    .mark_notified(recipient.id, Utc::now())
                    .await
                {
                    tracing::warn!(
                        recipient_id = %recipient.id,
                        error = %err,
                        "Failed to record notification timestamp"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    transfer_id = %transfer.id,
                    recipient = %recipient.email,
                    error = %err,
                    "Failed to notify recipient"
                );
            }
        }
    }

    fn download_url(&self, transfer: &Transfer, recipient: &Recipient) -> String {
        format!(
            "{}/api/v1/transfers/{}/download/{}?email={}",
            self.base_url, transfer.share_link, recipient.access_token, recipient.email
        )
    }

    /// Cancel an owned, non-terminal transfer.
    pub async fn cancel_transfer(&self, owner_id: Uuid, transfer_id: Uuid) -> Result<Transfer, AppError> {
        let transfer = self.transfers.cancel(transfer_id, owner_id).await?;
        tracing::info!(transfer_id = %transfer_id, "Transfer cancelled");
        Ok(transfer)
    }

    /// Flip every non-terminal past-expiry transfer to `Expired`.
    ///
    /// Driven externally (a scheduler or cron); the gateway also checks
    /// expiry per download so a late sweep never extends access.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let flipped = self.transfers.sweep_expired(now).await?;
        if flipped > 0 {
            tracing::info!(count = flipped, "Expired transfers swept");
        }
        Ok(flipped)
    }

    pub async fn list_transfers(&self, owner_id: Uuid) -> Result<Vec<Transfer>, AppError> {
        self.transfers.list_by_owner(owner_id).await
    }

    /// Assemble the external view of a transfer.
    pub async fn transfer_view(&self, transfer_id: Uuid) -> Result<TransferView, AppError> {
        let transfer = self
            .transfers
            .find_by_id(transfer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transfer not found: {}", transfer_id)))?;

        let mut file_names = Vec::with_capacity(transfer.file_ids.len());
        for file_id in &transfer.file_ids {
            if let Some(record) = self.files.find_by_id(*file_id).await? {
                file_names.push(record.filename);
            }
        }

        let recipient_emails = self
            .transfers
            .recipients_of(transfer.id)
            .await?
            .into_iter()
            .map(|recipient| recipient.email)
            .collect();

        Ok(TransferView {
            id: transfer.id,
            share_link: transfer.share_link,
            status: transfer.status,
            total_size_bytes: transfer.total_size_bytes,
            expires_at: transfer.expires_at,
            file_names,
            recipient_emails,
        })
    }
}
