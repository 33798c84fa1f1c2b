//! Pulse Server - REST backend for the Pulse social app
//!
//! # Modules
//!
//! ```text
//! pulse-server/src/
//! ├── auth/      # claim codec, verification pipeline, roles, temp credentials
//! ├── store/     # Postgres and in-memory persistence
//! ├── api/       # HTTP routes and handlers
//! ├── config.rs  # environment configuration
//! ├── logger.rs  # tracing setup
//! └── state.rs   # shared application state
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod delivery;
pub mod error;
pub mod logger;
pub mod state;
pub mod store;

pub use api::create_router;
pub use auth::{CredentialVerifier, Principal, RoleGroup, RoleSet};
pub use config::{AuthConfig, Config, ConfigError, LogConfig};
pub use delivery::{LogDelivery, ResetDelivery};
pub use logger::init_logger;
pub use state::AppState;
pub use store::{MemoryStore, PgStore, StoreError, Stores};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Security event on the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            level = $level,
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            $($arg)*
        )
    };
}
