//! Persistence collaborators
//!
//! The auth core only talks to these traits. [`postgres::PgStore`] backs them
//! with sqlx, [`memory::MemoryStore`] keeps everything in process (tests and
//! local development).

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{RoleRef, UserProfile};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Collaborator I/O failure. Never a typed auth failure; always answered with 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("id {0} is already taken")]
    DuplicateId(i64),
}

/// User joined with its role, as needed by verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub user_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub active: bool,
    pub role: RoleRef,
}

impl Subject {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            user_name: self.user_name.clone(),
            profile_image: self.profile_image.clone(),
            is_verified: self.is_verified,
            role: self.role.clone(),
        }
    }
}

/// Password material for login
#[derive(Debug, Clone)]
pub struct LoginAccount {
    pub subject_id: i64,
    pub password_hash: String,
    pub active: bool,
}

/// One issued session (`authorizations` row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub device_type: Option<String>,
    pub device_token: Option<String>,
    pub platform: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Single-use credential (`temp_tokens` row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempCredential {
    pub id: i64,
    pub subject_id: i64,
    pub token: String,
    pub expires_at: i64,
    pub used: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewTempCredential {
    pub subject_id: i64,
    pub token: String,
    pub expires_at: i64,
}

#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find_subject_with_role(&self, id: i64) -> Result<Option<Subject>, StoreError>;

    async fn find_login_account(&self, email: &str) -> Result<Option<LoginAccount>, StoreError>;

    /// Returns false when the user does not exist.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError>;

    /// Returns false when the user does not exist.
    async fn set_active(&self, id: i64, active: bool) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CredentialRecordStore: Send + Sync {
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError>;

    async fn find(&self, id: i64) -> Result<Option<CredentialRecord>, StoreError>;

    /// Compare-and-set on the stored refresh string. False if the record is
    /// gone or `expected_refresh` is no longer current.
    async fn rotate_tokens(
        &self,
        id: i64,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
        now: i64,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait TempCredentialStore: Send + Sync {
    async fn insert(&self, new: NewTempCredential) -> Result<TempCredential, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<TempCredential>, StoreError>;

    /// `UPDATE ... SET used = TRUE WHERE id = $1 AND used = FALSE`; true only
    /// for the caller that flipped the flag.
    async fn mark_used(&self, id: i64) -> Result<bool, StoreError>;
}

/// The three collaborators as trait objects
#[derive(Clone)]
pub struct Stores {
    pub subjects: Arc<dyn SubjectDirectory>,
    pub records: Arc<dyn CredentialRecordStore>,
    pub temp_credentials: Arc<dyn TempCredentialStore>,
}

impl Stores {
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            subjects: store.clone(),
            records: store.clone(),
            temp_credentials: store,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            subjects: store.clone(),
            records: store.clone(),
            temp_credentials: store,
        }
    }
}
