//! PostgreSQL collaborators

use async_trait::async_trait;
use shared::models::RoleRef;
use shared::util::now_millis;
use sqlx::PgPool;

use super::{
    CredentialRecord, CredentialRecordStore, LoginAccount, NewTempCredential, StoreError, Subject,
    SubjectDirectory, TempCredential, TempCredentialStore,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply `migrations/`
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SubjectRow {
    id: i64,
    name: String,
    email: String,
    user_name: Option<String>,
    profile_image: Option<String>,
    is_verified: bool,
    active: bool,
    role_id: i32,
    role_name: String,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: row.id,
            name: row.name,
            email: row.email,
            user_name: row.user_name,
            profile_image: row.profile_image,
            is_verified: row.is_verified,
            active: row.active,
            role: RoleRef {
                id: row.role_id,
                name: row.role_name,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: i64,
    password_hash: String,
    active: bool,
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    user_id: i64,
    access_token: String,
    refresh_token: String,
    device_type: Option<String>,
    device_token: Option<String>,
    platform: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<RecordRow> for CredentialRecord {
    fn from(row: RecordRow) -> Self {
        CredentialRecord {
            id: row.id,
            user_id: row.user_id,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            device_type: row.device_type,
            device_token: row.device_token,
            platform: row.platform,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TempRow {
    id: i64,
    user_id: i64,
    token: String,
    expires_at: i64,
    used: bool,
    created_at: i64,
}

impl From<TempRow> for TempCredential {
    fn from(row: TempRow) -> Self {
        TempCredential {
            id: row.id,
            subject_id: row.user_id,
            token: row.token,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SubjectDirectory for PgStore {
    async fn find_subject_with_role(&self, id: i64) -> Result<Option<Subject>, StoreError> {
        let row: Option<SubjectRow> = sqlx::query_as(
            "SELECT u.id, u.name, u.email, u.user_name, u.profile_image, u.is_verified, u.active, \
             r.id AS role_id, r.name AS role_name \
             FROM users u JOIN roles r ON r.id = u.userrole_id WHERE u.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Subject::from))
    }

    async fn find_login_account(&self, email: &str) -> Result<Option<LoginAccount>, StoreError> {
        let row: Option<LoginRow> =
            sqlx::query_as("SELECT id, password_hash, active FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| LoginAccount {
            subject_id: r.id,
            password_hash: r.password_hash,
            active: r.active,
        }))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(now_millis())
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET active = $1, updated_at = $2 WHERE id = $3")
            .bind(active)
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialRecordStore for PgStore {
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO authorizations \
             (id, user_id, access_token, refresh_token, device_type, device_token, platform, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .bind(&record.device_type)
        .bind(&record.device_token)
        .bind(&record.platform)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e
                && db.is_unique_violation()
            {
                return StoreError::DuplicateId(record.id);
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Option<CredentialRecord>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT id, user_id, access_token, refresh_token, device_type, device_token, platform, \
             created_at, updated_at FROM authorizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CredentialRecord::from))
    }

    async fn rotate_tokens(
        &self,
        id: i64,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
        now: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE authorizations SET access_token = $1, refresh_token = $2, updated_at = $3 \
             WHERE id = $4 AND refresh_token = $5",
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(now)
        .bind(id)
        .bind(expected_refresh)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM authorizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM authorizations WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TempCredentialStore for PgStore {
    async fn insert(&self, new: NewTempCredential) -> Result<TempCredential, StoreError> {
        let now = now_millis();
        let row: TempRow = sqlx::query_as(
            "INSERT INTO temp_tokens (user_id, token, expires_at, used, created_at, updated_at) \
             VALUES ($1, $2, $3, FALSE, $4, $4) \
             RETURNING id, user_id, token, expires_at, used, created_at",
        )
        .bind(new.subject_id)
        .bind(&new.token)
        .bind(new.expires_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TempCredential>, StoreError> {
        let row: Option<TempRow> = sqlx::query_as(
            "SELECT id, user_id, token, expires_at, used, created_at FROM temp_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TempCredential::from))
    }

    async fn mark_used(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE temp_tokens SET used = TRUE, updated_at = $1 WHERE id = $2 AND used = FALSE",
        )
        .bind(now_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
