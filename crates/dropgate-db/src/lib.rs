//! Dropgate persistence layer
//!
//! Repository traits for the three aggregates (file records, transfers,
//! quota accounts) plus in-memory implementations backed by id-indexed
//! maps. Services depend only on the traits, so a durable backend can be
//! swapped in without touching the pipeline code.

pub mod db;

pub use db::files::{CanonicalInsert, FileRepository, InMemoryFileRepository};
pub use db::quota::{InMemoryQuotaLedger, QuotaLedger};
pub use db::transfers::{InMemoryTransferRepository, TransferRepository};
