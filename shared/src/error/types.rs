//! Application error type

use super::codes::ErrorCode;
use crate::response::ApiResponse;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error crossing the HTTP boundary: a stable code, a client-safe message and
/// optional structured details.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// `"<resource> not found"`, with the resource name in details
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorCode::PermissionDenied)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();

        // System errors go out with the generic message only
        let body = if self.code.category().is_client_facing() {
            ApiResponse::error(&self)
        } else {
            tracing::error!(code = %self.code, message = %self.message, "System error");
            ApiResponse::error(&AppError::new(self.code))
        };

        let mut response = (status, Json(body)).into_response();
        // Request logging middleware reads this back out
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::SubjectNotFound);
        assert_eq!(err.code, ErrorCode::SubjectNotFound);
        assert_eq!(err.message, "User not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "email")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "email");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_not_found_names_the_resource() {
        let err = AppError::not_found("Route");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.to_string(), "Route not found");
        assert_eq!(err.details.unwrap()["resource"], "Route");
    }

    #[test]
    fn test_into_response_uses_mapped_status() {
        let response = AppError::token_expired().into_response();
        assert_eq!(response.status().as_u16(), 601);

        let response = AppError::new(ErrorCode::MissingCredential).into_response();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[test]
    fn test_system_error_message_is_generic() {
        let err = AppError::with_message(ErrorCode::DatabaseError, "connection refused at 10.0.0.3");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_travels_in_response_extensions() {
        let response = AppError::forbidden().into_response();
        let carried = response.extensions().get::<AppError>().unwrap();
        assert_eq!(carried.code, ErrorCode::PermissionDenied);
    }
}
