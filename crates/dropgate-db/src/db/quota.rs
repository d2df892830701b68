//! Quota ledger
//!
//! Tracks per-account storage usage against a plan ceiling. `reserve` is the
//! only way usage grows and it is a single atomic check-and-add: it either
//! charges the full amount or fails with `QuotaExceeded`, never partially
//! and never by clamping. `release` shrinks usage and clamps at zero.

use async_trait::async_trait;
use dropgate_core::models::QuotaUsage;
use dropgate_core::AppError;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Atomic per-account storage accounting.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Whether the account could currently fit `bytes` more. Advisory only;
    /// `reserve` re-checks under the same lock that applies the charge.
    async fn has_available(&self, account_id: Uuid, bytes: u64) -> Result<bool, AppError>;

    /// Atomically charge `bytes` against the account, or fail with
    /// `QuotaExceeded` leaving usage untouched.
    async fn reserve(&self, account_id: Uuid, bytes: u64) -> Result<(), AppError>;

    /// Return `bytes` to the account. Usage clamps at zero rather than
    /// underflowing if accounting ever drifts.
    async fn release(&self, account_id: Uuid, bytes: u64) -> Result<(), AppError>;

    async fn usage(&self, account_id: Uuid) -> Result<QuotaUsage, AppError>;

    /// Set the account's ceiling, e.g. on plan change. Existing usage is
    /// kept even if it now exceeds the new ceiling.
    async fn set_quota(&self, account_id: Uuid, total_bytes: u64) -> Result<(), AppError>;
}

struct Account {
    used_bytes: u64,
    total_bytes: u64,
}

/// In-memory quota ledger. Accounts are created lazily with the default
/// ceiling on first touch.
pub struct InMemoryQuotaLedger {
    accounts: Mutex<HashMap<Uuid, Account>>,
    default_quota_bytes: u64,
}

impl InMemoryQuotaLedger {
    pub fn new(default_quota_bytes: u64) -> Self {
        InMemoryQuotaLedger {
            accounts: Mutex::new(HashMap::new()),
            default_quota_bytes,
        }
    }
}

#[async_trait]
impl QuotaLedger for InMemoryQuotaLedger {
    async fn has_available(&self, account_id: Uuid, bytes: u64) -> Result<bool, AppError> {
        let mut accounts = self.accounts.lock().expect("quota lock poisoned");
        let account = accounts.entry(account_id).or_insert_with(|| Account {
            used_bytes: 0,
            total_bytes: self.default_quota_bytes,
        });
        Ok(account.used_bytes.saturating_add(bytes) <= account.total_bytes)
    }

    async fn reserve(&self, account_id: Uuid, bytes: u64) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().expect("quota lock poisoned");
        let account = accounts.entry(account_id).or_insert_with(|| Account {
            used_bytes: 0,
            total_bytes: self.default_quota_bytes,
        });

        let new_used = account.used_bytes.saturating_add(bytes);
        if new_used > account.total_bytes {
            return Err(AppError::QuotaExceeded {
                required: bytes,
                available: account.total_bytes.saturating_sub(account.used_bytes),
            });
        }

        account.used_bytes = new_used;
        tracing::debug!(
            account_id = %account_id,
            reserved_bytes = bytes,
            used_bytes = account.used_bytes,
            "Quota reserved"
        );
        Ok(())
    }

    async fn release(&self, account_id: Uuid, bytes: u64) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().expect("quota lock poisoned");
        let account = accounts.entry(account_id).or_insert_with(|| Account {
            used_bytes: 0,
            total_bytes: self.default_quota_bytes,
        });

        account.used_bytes = account.used_bytes.saturating_sub(bytes);
        tracing::debug!(
            account_id = %account_id,
            released_bytes = bytes,
            used_bytes = account.used_bytes,
            "Quota released"
        );
        Ok(())
    }

    async fn usage(&self, account_id: Uuid) -> Result<QuotaUsage, AppError> {
        let mut accounts = self.accounts.lock().expect("quota lock poisoned");
        let account = accounts.entry(account_id).or_insert_with(|| Account {
            used_bytes: 0,
            total_bytes: self.default_quota_bytes,
        });
        Ok(QuotaUsage {
            used_bytes: account.used_bytes,
            total_bytes: account.total_bytes,
        })
    }

    async fn set_quota(&self, account_id: Uuid, total_bytes: u64) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().expect("quota lock poisoned");
        let account = accounts.entry(account_id).or_insert_with(|| Account {
            used_bytes: 0,
            total_bytes: self.default_quota_bytes,
        });
        account.total_bytes = total_bytes;
        Ok(())
    }
}
