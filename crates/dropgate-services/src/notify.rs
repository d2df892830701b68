//! Recipient notification.
//!
//! Notification is a best-effort side channel: the transfer manager calls
//! the notifier per recipient and logs failures without failing the
//! transfer. The SMTP implementation is optional; `from_config` returns
//! `None` when notifications are disabled or SMTP is not configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dropgate_core::{AppError, Config};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Everything a notification channel needs to tell one recipient about a
/// transfer waiting for them.
#[derive(Debug, Clone)]
pub struct TransferNotification {
    pub recipient_email: String,
    pub transfer_title: String,
    pub sender_message: Option<String>,
    pub download_url: String,
    pub file_count: usize,
    pub total_size_bytes: u64,
    pub expires_at: DateTime<Utc>,
}

/// A channel for telling recipients about transfers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &TransferNotification) -> Result<(), AppError>;
}

/// Notifier that does nothing. Used in tests and when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, notification: &TransferNotification) -> Result<(), AppError> {
        tracing::debug!(
            recipient = %notification.recipient_email,
            "Notification skipped (no channel configured)"
        );
        Ok(())
    }
}

/// Render a byte count for human eyes, e.g. "14.7 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// SMTP notifier built on lettre.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailNotifier {
    /// Create the notifier from config. Returns `None` if notifications are
    /// disabled or SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_notifications_enabled {
            tracing::debug!("Email notifications disabled (EMAIL_NOTIFICATIONS_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port.unwrap_or(587);

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(
                host = %host,
                port = port,
                "Email notifier initialized (SMTP with STARTTLS)"
            );
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email notifier initialized (SMTP)");
            b.build()
        };

        Some(EmailNotifier {
            mailer: Arc::new(mailer),
            from,
        })
    }

    fn render_body(notification: &TransferNotification) -> String {
        let mut body = format!(
            "You have received \"{}\" ({} file{}, {}).\n",
            notification.transfer_title,
            notification.file_count,
            if notification.file_count == 1 { "" } else { "s" },
            format_file_size(notification.total_size_bytes),
        );
        if let Some(ref message) = notification.sender_message {
            body.push_str("\nMessage from the sender:\n");
            body.push_str(message);
            body.push('\n');
        }
        body.push_str(&format!("\nDownload: {}\n", notification.download_url));
        body.push_str(&format!(
            "\nThis link expires on {}.\n",
            notification.expires_at.format("%Y-%m-%d %H:%M UTC")
        ));
        body
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &TransferNotification) -> Result<(), AppError> {
        let to: Mailbox = notification
            .recipient_email
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {}", e)))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid SMTP_FROM: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(format!(
                "Files shared with you: {}",
                notification.transfer_title
            ))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::render_body(notification))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            recipient = %notification.recipient_email,
            "Transfer notification sent"
        );
        Ok(())
    }
}
