//! Unified error codes for the Pulse backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Temp credential errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on a
/// stable number instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Credential header is missing
    MissingCredential = 1001,
    /// Credential could not be split or decoded
    TokenInvalid = 1002,
    /// Credential expiry is in the past
    TokenExpired = 1003,
    /// No authenticated principal on the request
    NotAuthenticated = 1004,
    /// Subject referenced by the credential does not exist
    SubjectNotFound = 1005,
    /// Account is inactive
    AccountDisabled = 1006,
    /// Invalid email or password
    InvalidCredentials = 1007,
    /// Refresh credential rejected
    RefreshTokenInvalid = 1008,

    // ==================== 2xxx: Permission ====================
    /// Role is not a member of the allowed set
    PermissionDenied = 2001,

    // ==================== 3xxx: Temp credential ====================
    /// Temp credential not found
    TempCredentialNotFound = 3001,
    /// Temp credential has expired
    TempCredentialExpired = 3002,
    /// Temp credential was already redeemed
    TempCredentialUsed = 3003,
    /// New password is too short
    PasswordTooShort = 3004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Every assigned code
    pub const ALL: [ErrorCode; 22] = [
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::MissingCredential,
        ErrorCode::TokenInvalid,
        ErrorCode::TokenExpired,
        ErrorCode::NotAuthenticated,
        ErrorCode::SubjectNotFound,
        ErrorCode::AccountDisabled,
        ErrorCode::InvalidCredentials,
        ErrorCode::RefreshTokenInvalid,
        ErrorCode::PermissionDenied,
        ErrorCode::TempCredentialNotFound,
        ErrorCode::TempCredentialExpired,
        ErrorCode::TempCredentialUsed,
        ErrorCode::PasswordTooShort,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::ConfigError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default English message, used when no custom message is given
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::MissingCredential => "Access token required",
            ErrorCode::TokenInvalid => "Invalid access token format",
            ErrorCode::TokenExpired => "Access token expired",
            ErrorCode::NotAuthenticated => "Authentication required. Please log in.",
            ErrorCode::SubjectNotFound => "User not found",
            ErrorCode::AccountDisabled => "User account is inactive. Please contact support.",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::RefreshTokenInvalid => "Invalid refresh token",

            // Permission
            ErrorCode::PermissionDenied => {
                "Access denied. You do not have permission to access this resource."
            }

            // Temp credential
            ErrorCode::TempCredentialNotFound => "Token not found",
            ErrorCode::TempCredentialExpired => "Token has expired",
            ErrorCode::TempCredentialUsed => "Token has already been used",
            ErrorCode::PasswordTooShort => "Password is too short",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
