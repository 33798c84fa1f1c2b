//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

/// Non-standard status sent for an expired access credential.
///
/// Clients treat it as "refresh and retry", which a plain 401 cannot signal.
pub const TOKEN_EXPIRED_STATUS: u16 = 601;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 412 Precondition Failed
            Self::MissingCredential => StatusCode::PRECONDITION_FAILED,

            // 601 (custom expiry class)
            Self::TokenExpired => {
                StatusCode::from_u16(TOKEN_EXPIRED_STATUS).unwrap_or(StatusCode::UNAUTHORIZED)
            }

            // 404 Not Found
            Self::NotFound | Self::SubjectNotFound | Self::TempCredentialNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            Self::AlreadyExists | Self::TempCredentialUsed => StatusCode::CONFLICT,

            // 410 Gone
            Self::TempCredentialExpired => StatusCode::GONE,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::TokenInvalid
            | Self::AccountDisabled
            | Self::InvalidCredentials
            | Self::RefreshTokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation)
            Self::ValidationFailed | Self::InvalidRequest | Self::PasswordTooShort => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failure_statuses() {
        assert_eq!(ErrorCode::MissingCredential.http_status().as_u16(), 412);
        assert_eq!(ErrorCode::TokenInvalid.http_status().as_u16(), 401);
        assert_eq!(ErrorCode::TokenExpired.http_status().as_u16(), 601);
        assert_eq!(ErrorCode::SubjectNotFound.http_status().as_u16(), 404);
        assert_eq!(ErrorCode::AccountDisabled.http_status().as_u16(), 401);
        assert_eq!(ErrorCode::NotAuthenticated.http_status().as_u16(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status().as_u16(), 403);
    }

    #[test]
    fn test_temp_credential_statuses() {
        assert_eq!(
            ErrorCode::TempCredentialNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::TempCredentialExpired.http_status(),
            StatusCode::GONE
        );
        assert_eq!(
            ErrorCode::TempCredentialUsed.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_error_status() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PasswordTooShort.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
