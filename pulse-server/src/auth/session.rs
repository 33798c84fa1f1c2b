//! Credential record lifecycle: login, refresh rotation, logout

use std::sync::Arc;

use serde::Serialize;
use shared::models::{DeviceInfo, UserProfile};
use shared::util::snowflake_id;
use thiserror::Error;

use super::claims::{ClaimPurpose, Claims, CredentialFormat};
use super::codec::ClaimError;
use super::password::verify_password;
use super::pipeline::{self, AuthError};
use super::principal::Principal;
use crate::store::{CredentialRecord, CredentialRecordStore, StoreError, SubjectDirectory};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account {0} is inactive")]
    AccountDisabled(i64),

    #[error("refresh rejected: {0}")]
    RefreshRejected(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("claim encoding failed: {0}")]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Freshly minted claim pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
    #[serde(skip)]
    pub record_id: i64,
    pub user: UserProfile,
}

struct Minted {
    access_token: String,
    refresh_token: String,
    access_expires_at: i64,
    refresh_expires_at: i64,
}

#[derive(Clone)]
pub struct SessionService {
    format: Arc<CredentialFormat>,
    subjects: Arc<dyn SubjectDirectory>,
    records: Arc<dyn CredentialRecordStore>,
    access_ttl_ms: i64,
    refresh_ttl_ms: i64,
}

impl SessionService {
    pub fn new(
        format: Arc<CredentialFormat>,
        subjects: Arc<dyn SubjectDirectory>,
        records: Arc<dyn CredentialRecordStore>,
        access_ttl_ms: i64,
        refresh_ttl_ms: i64,
    ) -> Self {
        Self {
            format,
            subjects,
            records,
            access_ttl_ms,
            refresh_ttl_ms,
        }
    }

    fn mint(&self, subject_id: i64, record_id: i64, now: i64) -> Result<Minted, ClaimError> {
        let access_expires_at = expiry_after(now, self.access_ttl_ms)?;
        let refresh_expires_at = expiry_after(now, self.refresh_ttl_ms)?;
        let access_token = self.format.encode(
            ClaimPurpose::Access,
            &Claims {
                subject_id,
                credential_record_id: record_id,
                expires_at: access_expires_at,
            },
        )?;
        let refresh_token = self.format.encode(
            ClaimPurpose::Refresh,
            &Claims {
                subject_id,
                credential_record_id: record_id,
                expires_at: refresh_expires_at,
            },
        )?;
        Ok(Minted {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: DeviceInfo,
        now: i64,
    ) -> Result<IssuedSession, SessionError> {
        let account = self
            .subjects
            .find_login_account(email)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash) {
            return Err(SessionError::InvalidCredentials);
        }
        if !account.active {
            return Err(SessionError::AccountDisabled(account.subject_id));
        }

        let subject = self
            .subjects
            .find_subject_with_role(account.subject_id)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;

        // Snowflake ids share a millisecond with 4096 random suffixes; one
        // retry with a fresh id covers a collision.
        let mut attempts = 0;
        let (record_id, minted) = loop {
            attempts += 1;
            let record_id = snowflake_id();
            let minted = self.mint(subject.id, record_id, now)?;
            let record = CredentialRecord {
                id: record_id,
                user_id: subject.id,
                access_token: minted.access_token.clone(),
                refresh_token: minted.refresh_token.clone(),
                device_type: device.device_type.clone(),
                device_token: device.device_token.clone(),
                platform: device.platform.clone(),
                created_at: now,
                updated_at: now,
            };
            match self.records.insert(&record).await {
                Ok(()) => break (record_id, minted),
                Err(StoreError::DuplicateId(id)) if attempts < 2 => {
                    tracing::warn!(record_id = id, "Credential record id collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(user_id = subject.id, record_id, "User logged in");

        Ok(IssuedSession {
            access_token: minted.access_token,
            refresh_token: minted.refresh_token,
            access_expires_at: minted.access_expires_at,
            refresh_expires_at: minted.refresh_expires_at,
            record_id,
            user: subject.profile(),
        })
    }

    /// Rotate both claims. The presented refresh string must be the one
    /// currently stored on the record.
    pub async fn refresh(&self, refresh_token: &str, now: i64) -> Result<IssuedSession, SessionError> {
        let claims = self
            .format
            .decode(ClaimPurpose::Refresh, refresh_token)
            .map_err(|_| SessionError::RefreshRejected("malformed"))?;

        if now > claims.expires_at {
            return Err(SessionError::RefreshRejected("expired"));
        }

        let record = self
            .records
            .find(claims.credential_record_id)
            .await?
            .ok_or(SessionError::RefreshRejected("unknown session"))?;

        if record.user_id != claims.subject_id || record.refresh_token != refresh_token {
            return Err(SessionError::RefreshRejected("not current"));
        }

        let subject = pipeline::resolve_subject(self.subjects.as_ref(), &claims).await?;
        pipeline::check_active(&subject)?;

        let minted = self.mint(subject.id, record.id, now)?;
        let rotated = self
            .records
            .rotate_tokens(
                record.id,
                refresh_token,
                &minted.access_token,
                &minted.refresh_token,
                now,
            )
            .await?;
        if !rotated {
            return Err(SessionError::RefreshRejected("not current"));
        }

        tracing::debug!(user_id = subject.id, record_id = record.id, "Session refreshed");

        Ok(IssuedSession {
            access_token: minted.access_token,
            refresh_token: minted.refresh_token,
            access_expires_at: minted.access_expires_at,
            refresh_expires_at: minted.refresh_expires_at,
            record_id: record.id,
            user: subject.profile(),
        })
    }

    /// Drop the principal's record. Outstanding access claims keep verifying
    /// until they expire.
    pub async fn logout(&self, principal: &Principal) -> Result<bool, SessionError> {
        let removed = self.records.delete(principal.credential_record_id).await?;
        tracing::info!(
            user_id = principal.subject_id,
            record_id = principal.credential_record_id,
            removed,
            "User logged out"
        );
        Ok(removed)
    }

    pub async fn revoke_all(&self, user_id: i64) -> Result<u64, SessionError> {
        Ok(self.records.delete_for_user(user_id).await?)
    }
}

fn expiry_after(now: i64, ttl_ms: i64) -> Result<i64, ClaimError> {
    now.checked_add(ttl_ms)
        .ok_or_else(|| ClaimError::MalformedClaim("expiry overflows 64 bits".to_string()))
}
