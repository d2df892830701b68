//! Shared wiring for the service integration tests: memory storage,
//! in-memory repositories, and the three services built on top of them.

#![allow(dead_code)]

use dropgate_core::models::FileRecord;
use dropgate_core::Config;
use dropgate_db::{InMemoryFileRepository, InMemoryQuotaLedger, InMemoryTransferRepository};
use dropgate_services::{
    DownloadGateway, IngestionPipeline, NoopNotifier, Notifier, TransferManager,
};
use dropgate_services::ingestion::UploadRequest;
use dropgate_storage::MemoryStorage;
use std::sync::Arc;
use uuid::Uuid;

pub const MB: u64 = 1024 * 1024;

pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub files: Arc<InMemoryFileRepository>,
    pub transfers: Arc<InMemoryTransferRepository>,
    pub quota: Arc<InMemoryQuotaLedger>,
    pub pipeline: IngestionPipeline,
    pub manager: TransferManager,
    pub gateway: DownloadGateway,
}

pub fn harness(quota_bytes: u64) -> Harness {
    harness_with_notifier(quota_bytes, Arc::new(NoopNotifier))
}

pub fn harness_with_notifier(quota_bytes: u64, notifier: Arc<dyn Notifier>) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let files = Arc::new(InMemoryFileRepository::new());
    let transfers = Arc::new(InMemoryTransferRepository::new());
    let quota = Arc::new(InMemoryQuotaLedger::new(quota_bytes));
    let config = Config::default();

    let pipeline = IngestionPipeline::new(storage.clone(), files.clone(), quota.clone());
    let manager = TransferManager::new(files.clone(), transfers.clone(), notifier, &config);
    let gateway = DownloadGateway::new(storage.clone(), files.clone(), transfers.clone());

    Harness {
        storage,
        files,
        transfers,
        quota,
        pipeline,
        manager,
        gateway,
    }
}

impl Harness {
    pub async fn upload(&self, owner_id: Uuid, filename: &str, data: Vec<u8>) -> FileRecord {
        self.pipeline
            .ingest(
                UploadRequest {
                    owner_id,
                    filename: filename.to_string(),
                    mime_type: "application/octet-stream".to_string(),
                    declared_size_bytes: data.len() as u64,
                    client_ip: None,
                },
                data,
            )
            .await
            .expect("upload should succeed")
    }
}

/// Deterministic but non-trivial content of the given size.
pub fn content(seed: u8, size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| seed.wrapping_add((i % 251) as u8))
        .collect()
}
