//! API Response types
//!
//! Every endpoint answers with the same envelope:
//! ```json
//! {
//!     "status": "success",
//!     "statusCode": 200,
//!     "message": "OK",
//!     "data": { ... },
//!     "error": null
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{AppError, ErrorCategory, ErrorCode};

/// Outcome marker of the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Machine-readable part of a failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

/// Unified API response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    /// HTTP status sent with this body
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    /// Create a success response with custom message and data
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            status_code: 200,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<Value> {
    /// Create an error response from an AppError
    ///
    /// `data` is always an empty object so clients can read it unconditionally.
    pub fn error(err: &AppError) -> Self {
        Self {
            status: ResponseStatus::Error,
            status_code: err.http_status().as_u16(),
            message: err.message.clone(),
            data: Some(Value::Object(serde_json::Map::new())),
            error: Some(ErrorBody {
                code: err.code,
                category: err.code.category(),
                details: err.details.clone(),
            }),
        }
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = http::StatusCode::from_u16(self.status_code)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}
