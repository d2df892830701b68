//! Repositories for data access
//!
//! Each repository owns one domain aggregate and provides the queries and
//! atomic mutations the services need. Every mutation that must be atomic
//! (conditional quota reserve, canonical checksum insert, paired download
//! counter bump) happens inside a single critical section of its
//! repository.

pub mod files;
pub mod quota;
pub mod transfers;

pub use files::{CanonicalInsert, FileRepository, InMemoryFileRepository};
pub use quota::{InMemoryQuotaLedger, QuotaLedger};
pub use transfers::{InMemoryTransferRepository, TransferRepository};
