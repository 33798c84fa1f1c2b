//! Domain errors into `AppError`
//!
//! Typed auth and temp-credential failures pass through with their own code.
//! Store failures are logged with their source chain here and leave as a
//! generic `InternalError`.

use shared::error::{AppError, ErrorCode};

use crate::auth::pipeline::AuthError;
use crate::auth::session::SessionError;
use crate::auth::temp::TempCredentialError;
use crate::store::StoreError;

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => AppError::new(ErrorCode::MissingCredential),
            AuthError::MalformedToken(_) => AppError::new(ErrorCode::TokenInvalid),
            AuthError::CredentialExpired { .. } => AppError::token_expired(),
            AuthError::SubjectNotFound(_) => AppError::new(ErrorCode::SubjectNotFound),
            AuthError::SubjectInactive(_) => AppError::new(ErrorCode::AccountDisabled),
            AuthError::Unauthenticated => AppError::not_authenticated(),
            AuthError::Forbidden { .. } => AppError::forbidden(),
            AuthError::Store(store) => store_failure(&store),
        }
    }
}

impl From<TempCredentialError> for AppError {
    fn from(e: TempCredentialError) -> Self {
        match e {
            TempCredentialError::NotFound => AppError::new(ErrorCode::TempCredentialNotFound),
            TempCredentialError::Expired { .. } => AppError::new(ErrorCode::TempCredentialExpired),
            TempCredentialError::AlreadyUsed => AppError::new(ErrorCode::TempCredentialUsed),
            TempCredentialError::ExpiryOverflow => {
                tracing::error!("Temp credential expiry overflowed");
                AppError::new(ErrorCode::InternalError)
            }
            TempCredentialError::Store(store) => store_failure(&store),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidCredentials => AppError::invalid_credentials(),
            SessionError::AccountDisabled(_) => AppError::new(ErrorCode::AccountDisabled),
            SessionError::RefreshRejected(_) => AppError::new(ErrorCode::RefreshTokenInvalid),
            SessionError::Auth(auth) => auth.into(),
            SessionError::Claim(claim) => {
                tracing::error!(error = %claim, "Claim encoding failed");
                AppError::new(ErrorCode::InternalError)
            }
            SessionError::Store(store) => store_failure(&store),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        store_failure(&e)
    }
}

fn store_failure(e: &StoreError) -> AppError {
    tracing::error!(error = %error_chain(e), "Store operation failed");
    AppError::new(ErrorCode::InternalError)
}
