//! Dropgate services
//!
//! The use-case layer: file ingestion (checksum, dedup, encryption, quota),
//! transfer creation and notification, and the download gateway that
//! enforces the access gate before streaming content back. Services depend
//! on the repository traits in `dropgate-db` and the `Storage` trait in
//! `dropgate-storage`; nothing here knows about HTTP.

pub mod archive;
pub mod download;
pub mod ingestion;
pub mod notify;
pub mod telemetry;
pub mod tokens;
pub mod transfers;

pub use download::{DownloadGateway, DownloadPayload};
pub use ingestion::IngestionPipeline;
pub use notify::{EmailNotifier, NoopNotifier, Notifier, TransferNotification};
pub use tokens::ShareTokenIssuer;
pub use transfers::{NewTransfer, TransferManager};
