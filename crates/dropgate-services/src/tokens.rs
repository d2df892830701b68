//! Unique token issuance for share links and access tokens.
//!
//! Randomness comes from `dropgate_core::token`; this layer adds the
//! uniqueness guarantee by probing the transfer repository and retrying on
//! collision, up to a fixed bound. With a 57-character alphabet a collision
//! is already freak-rare at 16 characters, so exhausting the bound points
//! at a broken generator rather than bad luck.

use dropgate_core::token::{random_token, MAX_GENERATION_ATTEMPTS, SHARE_LINK_LENGTH};
use dropgate_core::AppError;
use dropgate_db::TransferRepository;
use std::sync::Arc;

/// Issues globally unique share links and recipient access tokens.
#[derive(Clone)]
pub struct ShareTokenIssuer {
    transfers: Arc<dyn TransferRepository>,
    access_token_length: usize,
}

impl ShareTokenIssuer {
    pub fn new(transfers: Arc<dyn TransferRepository>, access_token_length: usize) -> Self {
        ShareTokenIssuer {
            transfers,
            access_token_length,
        }
    }

    /// Generate a share link no existing transfer uses.
    pub async fn issue_share_link(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = random_token(SHARE_LINK_LENGTH);
            if !self.transfers.share_link_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::warn!(attempt, "Share link collision, retrying");
        }
        Err(AppError::TokenGenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    /// Generate an access token no existing recipient uses.
    pub async fn issue_access_token(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = random_token(self.access_token_length);
            if !self.transfers.access_token_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::warn!(attempt, "Access token collision, retrying");
        }
        Err(AppError::TokenGenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use dropgate_core::models::{Recipient, Transfer};
    use dropgate_core::token::ACCESS_TOKEN_LENGTH;
    use dropgate_db::InMemoryTransferRepository;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_issue_against_empty_repository() {
        let repo = Arc::new(InMemoryTransferRepository::new());
        let issuer = ShareTokenIssuer::new(repo, ACCESS_TOKEN_LENGTH);

        let link = issuer.issue_share_link().await.unwrap();
        assert_eq!(link.len(), SHARE_LINK_LENGTH);

        let token = issuer.issue_access_token().await.unwrap();
        assert_eq!(token.len(), ACCESS_TOKEN_LENGTH);
        assert_ne!(link, token);
    }

    /// Repository stub that reports every candidate as taken.
    struct SaturatedRepository {
        probes: AtomicU32,
    }

    #[async_trait]
    impl TransferRepository for SaturatedRepository {
        async fn insert(&self, _transfer: Transfer) -> Result<Transfer, AppError> {
            unimplemented!()
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Transfer>, AppError> {
            unimplemented!()
        }
        async fn find_by_share_link(
            &self,
            _share_link: &str,
        ) -> Result<Option<Transfer>, AppError> {
            unimplemented!()
        }
        async fn share_link_exists(&self, _share_link: &str) -> Result<bool, AppError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
        async fn access_token_exists(&self, _access_token: &str) -> Result<bool, AppError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
        async fn insert_recipient(&self, _recipient: Recipient) -> Result<Recipient, AppError> {
            unimplemented!()
        }
        async fn recipients_of(&self, _transfer_id: Uuid) -> Result<Vec<Recipient>, AppError> {
            unimplemented!()
        }
        async fn find_recipient(
            &self,
            _transfer_id: Uuid,
            _email: &str,
        ) -> Result<Option<Recipient>, AppError> {
            unimplemented!()
        }
        async fn mark_notified(
            &self,
            _recipient_id: Uuid,
            _now: DateTime<Utc>,
        ) -> Result<(), AppError> {
            unimplemented!()
        }
        async fn increment_download_counters(
            &self,
            _transfer_id: Uuid,
            _recipient_id: Uuid,
        ) -> Result<(), AppError> {
            unimplemented!()
        }
        async fn complete(&self, _id: Uuid, _now: DateTime<Utc>) -> Result<Transfer, AppError> {
            unimplemented!()
        }
        async fn mark_failed(&self, _id: Uuid) -> Result<(), AppError> {
            unimplemented!()
        }
        async fn cancel(&self, _id: Uuid, _owner_id: Uuid) -> Result<Transfer, AppError> {
            unimplemented!()
        }
        async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<usize, AppError> {
            unimplemented!()
        }
        async fn list_by_owner(&self, _owner_id: Uuid) -> Result<Vec<Transfer>, AppError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_exhaustion_is_bounded_and_fatal() {
        let repo = Arc::new(SaturatedRepository {
            probes: AtomicU32::new(0),
        });
        let issuer = ShareTokenIssuer::new(repo.clone(), ACCESS_TOKEN_LENGTH);

        let result = issuer.issue_share_link().await;
        assert!(matches!(
            result,
            Err(AppError::TokenGenerationExhausted { attempts: 10 })
        ));
        assert_eq!(repo.probes.load(Ordering::SeqCst), MAX_GENERATION_ATTEMPTS);
    }
}
