//! Transfer creation: tokens, recipients, lifecycle, notification.

mod common;

use async_trait::async_trait;
use common::{content, harness, harness_with_notifier, MB};
use dropgate_core::models::TransferStatus;
use dropgate_core::token::{SAFE_CHARS, SHARE_LINK_LENGTH};
use dropgate_core::AppError;
use dropgate_db::TransferRepository;
use dropgate_services::{NewTransfer, Notifier, TransferNotification};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn new_transfer(owner_id: Uuid, file_ids: Vec<Uuid>, emails: &[&str]) -> NewTransfer {
    NewTransfer {
        owner_id,
        title: "Event photos".to_string(),
        message: Some("Here are the pictures from Saturday".to_string()),
        file_ids,
        recipient_emails: emails.iter().map(|s| s.to_string()).collect(),
        download_limit: None,
        expires_in_days: None,
    }
}

#[tokio::test]
async fn transfer_gets_share_link_and_per_recipient_tokens() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();

    let a = h.upload(owner, "a.jpg", content(1, 10 * MB as usize)).await;
    let b = h.upload(owner, "b.jpg", content(2, 5 * MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(
            owner,
            vec![a.id, b.id],
            &["alice@example.com", "bob@example.com"],
        ))
        .await
        .unwrap();

    assert_eq!(transfer.share_link.len(), SHARE_LINK_LENGTH);
    assert!(transfer.share_link.bytes().all(|c| SAFE_CHARS.contains(&c)));
    assert_eq!(transfer.status, TransferStatus::Completed);
    assert!(transfer.completed_at.is_some());
    assert_eq!(transfer.total_size_bytes, 15 * MB);
    assert_eq!(transfer.file_ids, vec![a.id, b.id]);

    let recipients = h.transfers.recipients_of(transfer.id).await.unwrap();
    assert_eq!(recipients.len(), 2);
    assert_ne!(recipients[0].access_token, recipients[1].access_token);
    for recipient in &recipients {
        assert_eq!(recipient.access_token.len(), 32);
        assert_eq!(recipient.download_count, 0);
        // NoopNotifier succeeds, so the notification timestamp is stamped
        assert!(recipient.notified_at.is_some());
    }
}

#[tokio::test]
async fn unknown_files_are_skipped_with_remainder_kept() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "kept.pdf", content(1, MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(
            owner,
            vec![a.id, Uuid::new_v4()],
            &["alice@example.com"],
        ))
        .await
        .unwrap();

    assert_eq!(transfer.file_ids, vec![a.id]);
    assert_eq!(transfer.total_size_bytes, MB);
}

#[tokio::test]
async fn transfer_with_no_valid_files_is_rejected() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();

    // Another owner's file is as invisible as a random id
    let foreign = h
        .upload(Uuid::new_v4(), "foreign.pdf", content(1, MB as usize))
        .await;

    let result = h
        .manager
        .create_transfer(new_transfer(
            owner,
            vec![foreign.id, Uuid::new_v4()],
            &["alice@example.com"],
        ))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(h.manager.list_transfers(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_without_recipients_is_rejected() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;

    let result = h.manager.create_transfer(new_transfer(owner, vec![a.id], &[])).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = h
        .manager
        .create_transfer(new_transfer(owner, vec![a.id], &["not-an-email"]))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn duplicate_recipient_emails_are_collapsed() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(
            owner,
            vec![a.id],
            &["Alice@Example.com", "alice@example.com ", "bob@example.com"],
        ))
        .await
        .unwrap();

    let recipients = h.transfers.recipients_of(transfer.id).await.unwrap();
    assert_eq!(recipients.len(), 2);
    assert_eq!(recipients[0].email, "alice@example.com");
    assert_eq!(recipients[1].email, "bob@example.com");
}

struct FailingNotifier {
    attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &TransferNotification) -> Result<(), AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Internal("smtp connection refused".to_string()))
    }
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_transfer() {
    let notifier = Arc::new(FailingNotifier {
        attempts: AtomicUsize::new(0),
    });
    let h = harness_with_notifier(100 * MB, notifier.clone());
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(
            owner,
            vec![a.id],
            &["alice@example.com", "bob@example.com"],
        ))
        .await
        .unwrap();

    assert_eq!(transfer.status, TransferStatus::Completed);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);

    // notified_at stays unset when delivery failed
    for recipient in h.transfers.recipients_of(transfer.id).await.unwrap() {
        assert!(recipient.notified_at.is_none());
    }
}

#[tokio::test]
async fn recording_notifier_sees_download_url_with_token() {
    struct RecordingNotifier {
        urls: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &TransferNotification) -> Result<(), AppError> {
            self.urls
                .lock()
                .unwrap()
                .push(notification.download_url.clone());
            Ok(())
        }
    }

    let notifier = Arc::new(RecordingNotifier {
        urls: std::sync::Mutex::new(Vec::new()),
    });
    let h = harness_with_notifier(100 * MB, notifier.clone());
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(owner, vec![a.id], &["alice@example.com"]))
        .await
        .unwrap();
    let recipient = h.transfers.recipients_of(transfer.id).await.unwrap().remove(0);

    let urls = notifier.urls.lock().unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains(&transfer.share_link));
    assert!(urls[0].contains(&recipient.access_token));
    assert!(urls[0].contains("email=alice@example.com"));
}

#[tokio::test]
async fn zero_download_limit_is_rejected() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;

    let mut request = new_transfer(owner, vec![a.id], &["alice@example.com"]);
    request.download_limit = Some(0);

    let result = h.manager.create_transfer(request).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn owner_can_cancel_a_completed_transfer_once() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(owner, vec![a.id], &["alice@example.com"]))
        .await
        .unwrap();

    let cancelled = h.manager.cancel_transfer(owner, transfer.id).await.unwrap();
    assert_eq!(cancelled.status, TransferStatus::Cancelled);

    let result = h.manager.cancel_transfer(owner, transfer.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn transfer_view_lists_files_and_recipients_without_tokens() {
    let h = harness(100 * MB);
    let owner = Uuid::new_v4();
    let a = h.upload(owner, "a.pdf", content(1, MB as usize)).await;
    let b = h.upload(owner, "b.pdf", content(2, MB as usize)).await;

    let transfer = h
        .manager
        .create_transfer(new_transfer(
            owner,
            vec![a.id, b.id],
            &["alice@example.com"],
        ))
        .await
        .unwrap();

    let view = h.manager.transfer_view(transfer.id).await.unwrap();
    assert_eq!(view.share_link, transfer.share_link);
    assert_eq!(view.file_names, vec!["a.pdf", "b.pdf"]);
    assert_eq!(view.recipient_emails, vec!["alice@example.com"]);

    let recipient = h.transfers.recipients_of(transfer.id).await.unwrap().remove(0);
    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains(&recipient.access_token));
}
