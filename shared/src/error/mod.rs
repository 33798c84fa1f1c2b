//! Unified error system for the Pulse backend
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Temp credential errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//! use shared::response::ApiResponse;
//!
//! let err = AppError::new(ErrorCode::TokenExpired);
//! assert_eq!(err.http_status().as_u16(), 601);
//!
//! let err = AppError::validation("Missing required field")
//!     .with_detail("field", "email");
//! let body = ApiResponse::error(&err);
//! assert_eq!(body.status_code, 400);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use http::TOKEN_EXPIRED_STATUS;
pub use types::{AppError, AppResult};
