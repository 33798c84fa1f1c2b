//! Single-use temp credentials
//!
//! The issued string is the encoding of a random 64-bit id. Unlike access
//! claims it is resolved through storage and burned on first redeem.

use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use super::codec::ClaimCodec;
use crate::store::{NewTempCredential, StoreError, TempCredential, TempCredentialStore};

#[derive(Debug, Error)]
pub enum TempCredentialError {
    #[error("temp credential not found")]
    NotFound,

    #[error("temp credential expired at {expired_at}")]
    Expired { expired_at: i64 },

    #[error("temp credential already used")]
    AlreadyUsed,

    #[error("expiry overflows 64 bits")]
    ExpiryOverflow,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TempCredentialService {
    codec: Arc<ClaimCodec>,
    store: Arc<dyn TempCredentialStore>,
    ttl_ms: i64,
}

impl TempCredentialService {
    pub fn new(codec: Arc<ClaimCodec>, store: Arc<dyn TempCredentialStore>, ttl_ms: i64) -> Self {
        Self { codec, store, ttl_ms }
    }

    pub async fn issue(&self, subject_id: i64, now: i64) -> Result<TempCredential, TempCredentialError> {
        let expires_at = now
            .checked_add(self.ttl_ms)
            .ok_or(TempCredentialError::ExpiryOverflow)?;
        let token = self.codec.encode(OsRng.next_u64());
        let credential = self
            .store
            .insert(NewTempCredential {
                subject_id,
                token,
                expires_at,
            })
            .await?;

        tracing::debug!(subject_id, credential_id = credential.id, "Issued temp credential");
        Ok(credential)
    }

    /// Check order: exists, not expired, not used, then the conditional flip.
    /// Returns the subject id.
    pub async fn redeem(&self, token: &str, now: i64) -> Result<i64, TempCredentialError> {
        let credential = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(TempCredentialError::NotFound)?;

        if now > credential.expires_at {
            return Err(TempCredentialError::Expired {
                expired_at: credential.expires_at,
            });
        }
        if credential.used {
            return Err(TempCredentialError::AlreadyUsed);
        }

        // Losing a concurrent race shows up as zero rows affected
        if !self.store.mark_used(credential.id).await? {
            return Err(TempCredentialError::AlreadyUsed);
        }

        Ok(credential.subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::codec::{Alphabet, BASE62};
    use crate::store::memory::{MemoryStore, NewUser};

    const NOW: i64 = 1_700_000_000_000;
    const TTL: i64 = 900_000;

    fn service() -> (TempCredentialService, i64) {
        service_with_ttl(TTL)
    }

    fn service_with_ttl(ttl: i64) -> (TempCredentialService, i64) {
        let store = MemoryStore::new();
        let subject = store.insert_user(NewUser::new("Ada", "ada@example.com", "hash"));
        let codec = Arc::new(ClaimCodec::new(Alphabet::new(BASE62).unwrap(), '.').unwrap());
        (TempCredentialService::new(codec, Arc::new(store), ttl), subject)
    }

    #[tokio::test]
    async fn overflowing_expiry_is_refused() {
        let (svc, subject) = service_with_ttl(i64::MAX);
        assert!(matches!(
            svc.issue(subject, NOW).await,
            Err(TempCredentialError::ExpiryOverflow)
        ));
    }

    #[tokio::test]
    async fn issue_sets_expiry_and_unused() {
        let (svc, subject) = service();
        let credential = svc.issue(subject, NOW).await.unwrap();
        assert_eq!(credential.expires_at, NOW + TTL);
        assert!(!credential.used);
        assert_eq!(credential.subject_id, subject);
        assert!(!credential.token.is_empty());
    }

    #[tokio::test]
    async fn redeem_once() {
        let (svc, subject) = service();
        let credential = svc.issue(subject, NOW).await.unwrap();

        assert_eq!(svc.redeem(&credential.token, NOW + 1).await.unwrap(), subject);
        assert!(matches!(
            svc.redeem(&credential.token, NOW + 2).await,
            Err(TempCredentialError::AlreadyUsed)
        ));
    }

    #[tokio::test]
    async fn unknown_token() {
        let (svc, _) = service();
        assert!(matches!(
            svc.redeem("nope", NOW).await,
            Err(TempCredentialError::NotFound)
        ));
    }

    #[tokio::test]
    async fn expiry_is_checked_before_used_flag() {
        let (svc, subject) = service();
        let credential = svc.issue(subject, NOW).await.unwrap();

        // Boundary: exactly at expiry still redeems
        let (svc2, subject2) = service();
        let other = svc2.issue(subject2, NOW).await.unwrap();
        assert!(svc2.redeem(&other.token, NOW + TTL).await.is_ok());

        assert!(matches!(
            svc.redeem(&credential.token, NOW + TTL + 1).await,
            Err(TempCredentialError::Expired { .. })
        ));
        // Expired is reported even once used
        assert!(matches!(
            svc2.redeem(&other.token, NOW + TTL + 1).await,
            Err(TempCredentialError::Expired { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redeem_has_one_winner() {
        let (svc, subject) = service();
        let credential = svc.issue(subject, NOW).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                let token = credential.token.clone();
                tokio::spawn(async move { svc.redeem(&token, NOW + 1).await })
            })
            .collect();

        let mut wins = 0;
        let mut already_used = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(id) => {
                    assert_eq!(id, subject);
                    wins += 1;
                }
                Err(TempCredentialError::AlreadyUsed) => already_used += 1,
                Err(other) => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(already_used, 7);
    }
}
