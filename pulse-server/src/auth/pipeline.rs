//! Access-claim verification
//!
//! | Stage | Check | Failure |
//! |-------|-------|---------|
//! | S0 | header present and non-empty | `MissingCredential` |
//! | S1 | exactly 4 fields | `MalformedToken` |
//! | S2 | fields decode (and tag verifies when signed) | `MalformedToken` |
//! | S3 | `now <= expiry` | `CredentialExpired` |
//! | S4 | subject exists | `SubjectNotFound` |
//! | S5 | subject active | `SubjectInactive` |
//! | S6 | build [`Principal`] | |
//!
//! S0 to S3 are pure. S4 is the only await point.

use std::sync::Arc;

use thiserror::Error;

use super::claims::{ClaimPurpose, Claims, CredentialFormat};
use super::codec::ClaimError;
use super::principal::Principal;
use crate::store::{StoreError, Subject, SubjectDirectory};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("access token required")]
    MissingCredential,

    #[error("malformed access token: {0}")]
    MalformedToken(#[from] ClaimError),

    #[error("access token expired at {expired_at}")]
    CredentialExpired { expired_at: i64 },

    #[error("subject {0} not found")]
    SubjectNotFound(i64),

    #[error("subject {0} is inactive")]
    SubjectInactive(i64),

    #[error("no authenticated principal")]
    Unauthenticated,

    #[error("role {role_id} not in allowed set")]
    Forbidden { role_id: i32 },

    #[error("subject lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Short event name for security logs
    pub fn event(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "auth_missing",
            AuthError::MalformedToken(_) => "auth_malformed",
            AuthError::CredentialExpired { .. } => "auth_expired",
            AuthError::SubjectNotFound(_) => "auth_subject_missing",
            AuthError::SubjectInactive(_) => "auth_subject_inactive",
            AuthError::Unauthenticated => "auth_required",
            AuthError::Forbidden { .. } => "permission_denied",
            AuthError::Store(_) => "auth_store_error",
        }
    }
}

/// S0
pub fn require_header(header: Option<&str>) -> Result<&str, AuthError> {
    match header {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AuthError::MissingCredential),
    }
}

/// S1 + S2
pub fn decode_claims(format: &CredentialFormat, token: &str) -> Result<Claims, AuthError> {
    Ok(format.decode(ClaimPurpose::Access, token)?)
}

/// S3. Expiry equal to `now` is still valid.
pub fn check_expiry(claims: &Claims, now: i64) -> Result<(), AuthError> {
    if now > claims.expires_at {
        return Err(AuthError::CredentialExpired {
            expired_at: claims.expires_at,
        });
    }
    Ok(())
}

/// S0 through S3
pub fn verify_claims(
    format: &CredentialFormat,
    header: Option<&str>,
    now: i64,
) -> Result<Claims, AuthError> {
    let token = require_header(header)?;
    let claims = decode_claims(format, token)?;
    check_expiry(&claims, now)?;
    Ok(claims)
}

/// S4
pub async fn resolve_subject(
    subjects: &dyn SubjectDirectory,
    claims: &Claims,
) -> Result<Subject, AuthError> {
    subjects
        .find_subject_with_role(claims.subject_id)
        .await?
        .ok_or(AuthError::SubjectNotFound(claims.subject_id))
}

/// S5
pub fn check_active(subject: &Subject) -> Result<(), AuthError> {
    if !subject.active {
        return Err(AuthError::SubjectInactive(subject.id));
    }
    Ok(())
}

/// Full pipeline; stateless apart from the subject lookup
pub async fn verify(
    format: &CredentialFormat,
    subjects: &dyn SubjectDirectory,
    header: Option<&str>,
    now: i64,
) -> Result<Principal, AuthError> {
    let claims = verify_claims(format, header, now)?;
    let subject = resolve_subject(subjects, &claims).await?;
    check_active(&subject)?;
    Ok(Principal::new(&claims, subject))
}

/// Format and subject directory bundled for the application state
#[derive(Clone)]
pub struct CredentialVerifier {
    format: Arc<CredentialFormat>,
    subjects: Arc<dyn SubjectDirectory>,
}

impl CredentialVerifier {
    pub fn new(format: Arc<CredentialFormat>, subjects: Arc<dyn SubjectDirectory>) -> Self {
        Self { format, subjects }
    }

    pub fn format(&self) -> &CredentialFormat {
        &self.format
    }

    pub async fn verify(&self, header: Option<&str>, now: i64) -> Result<Principal, AuthError> {
        verify(&self.format, self.subjects.as_ref(), header, now).await
    }
}
