//! Data models
//!
//! Shared between the server and API clients. All IDs are `i64` except role
//! ids, which follow the `roles` table (`INTEGER`).

pub mod role;
pub mod user;

// Re-exports
pub use role::*;
pub use user::*;
