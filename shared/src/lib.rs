//! Shared types for the Pulse backend
//!
//! Common types used by the server crate and by Rust API clients: error codes,
//! the response envelope, role and user DTOs, and small utilities.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use response::ApiResponse;
