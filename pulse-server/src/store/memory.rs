//! In-process collaborators for tests and database-less development

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{Role, RoleRef};
use shared::util::now_millis;

use super::{
    CredentialRecord, CredentialRecordStore, LoginAccount, NewTempCredential, StoreError, Subject,
    SubjectDirectory, TempCredential, TempCredentialStore,
};

/// User to seed into a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub user_name: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            user_name: None,
            password_hash: password_hash.into(),
            role: Role::User,
            active: true,
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Clone)]
struct UserRow {
    subject: Subject,
    password_hash: String,
}

#[derive(Default)]
struct State {
    next_user_id: i64,
    next_temp_id: i64,
    users: HashMap<i64, UserRow>,
    records: HashMap<i64, CredentialRecord>,
    temp_credentials: HashMap<i64, TempCredential>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user; returns its id
    pub fn insert_user(&self, user: NewUser) -> i64 {
        let id = self.state.lock().next_user_id + 1;
        self.insert_user_with_id(id, user);
        id
    }

    /// Seed a user under a fixed id
    pub fn insert_user_with_id(&self, id: i64, user: NewUser) {
        let mut state = self.state.lock();
        state.next_user_id = state.next_user_id.max(id);
        let subject = Subject {
            id,
            name: user.name,
            email: user.email,
            user_name: user.user_name,
            profile_image: None,
            is_verified: false,
            active: user.active,
            role: RoleRef::from(user.role),
        };
        state.users.insert(
            id,
            UserRow {
                subject,
                password_hash: user.password_hash,
            },
        );
    }

    pub fn record_count_for(&self, user_id: i64) -> usize {
        self.state
            .lock()
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .count()
    }

    pub fn password_hash_of(&self, user_id: i64) -> Option<String> {
        self.state
            .lock()
            .users
            .get(&user_id)
            .map(|u| u.password_hash.clone())
    }
}

#[async_trait]
impl SubjectDirectory for MemoryStore {
    async fn find_subject_with_role(&self, id: i64) -> Result<Option<Subject>, StoreError> {
        Ok(self.state.lock().users.get(&id).map(|u| u.subject.clone()))
    }

    async fn find_login_account(&self, email: &str) -> Result<Option<LoginAccount>, StoreError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.subject.email == email)
            .map(|u| LoginAccount {
                subject_id: u.subject.id,
                password_hash: u.password_hash.clone(),
                active: u.subject.active,
            }))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.users.get_mut(&id) {
            Some(user) => {
                user.subject.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CredentialRecordStore for MemoryStore {
    async fn insert(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if !state.users.contains_key(&record.user_id) {
            return Err(StoreError::Unavailable(format!(
                "user {} does not exist",
                record.user_id
            )));
        }
        if state.records.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        state.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.state.lock().records.get(&id).cloned())
    }

    async fn rotate_tokens(
        &self,
        id: i64,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
        now: i64,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.records.get_mut(&id) {
            Some(record) if record.refresh_token == expected_refresh => {
                record.access_token = access_token.to_string();
                record.refresh_token = refresh_token.to_string();
                record.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.state.lock().records.remove(&id).is_some())
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, StoreError> {
        let mut state = self.state.lock();
        let before = state.records.len();
        state.records.retain(|_, r| r.user_id != user_id);
        Ok((before - state.records.len()) as u64)
    }
}

#[async_trait]
impl TempCredentialStore for MemoryStore {
    async fn insert(&self, new: NewTempCredential) -> Result<TempCredential, StoreError> {
        let mut state = self.state.lock();
        if state.temp_credentials.values().any(|t| t.token == new.token) {
            return Err(StoreError::Unavailable("duplicate temp token".to_string()));
        }
        state.next_temp_id += 1;
        let credential = TempCredential {
            id: state.next_temp_id,
            subject_id: new.subject_id,
            token: new.token,
            expires_at: new.expires_at,
            used: false,
            created_at: now_millis(),
        };
        state
            .temp_credentials
            .insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TempCredential>, StoreError> {
        Ok(self
            .state
            .lock()
            .temp_credentials
            .values()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn mark_used(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.temp_credentials.get_mut(&id) {
            Some(credential) if !credential.used => {
                credential.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subject_lookup_joins_role() {
        let store = MemoryStore::new();
        let id = store.insert_user(NewUser::new("Ada", "ada@example.com", "hash").role(Role::Admin));

        let subject = store.find_subject_with_role(id).await.unwrap().unwrap();
        assert_eq!(subject.role.id, 2);
        assert_eq!(subject.role.name, "admin");
        assert!(subject.active);
        assert!(store.find_subject_with_role(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_used_is_compare_and_set() {
        let store = MemoryStore::new();
        let id = store.insert_user(NewUser::new("Ada", "ada@example.com", "hash"));
        let credential = TempCredentialStore::insert(
            &store,
            NewTempCredential {
                subject_id: id,
                token: "abc".to_string(),
                expires_at: now_millis() + 1_000,
            },
        )
        .await
        .unwrap();

        assert!(store.mark_used(credential.id).await.unwrap());
        assert!(!store.mark_used(credential.id).await.unwrap());
        assert!(!store.mark_used(credential.id + 100).await.unwrap());
    }

    #[tokio::test]
    async fn rotate_requires_current_refresh() {
        let store = MemoryStore::new();
        let user_id = store.insert_user(NewUser::new("Ada", "ada@example.com", "hash"));
        let record = CredentialRecord {
            id: 10,
            user_id,
            access_token: "a1".to_string(),
            refresh_token: "r1".to_string(),
            device_type: None,
            device_token: None,
            platform: None,
            created_at: 0,
            updated_at: 0,
        };
        CredentialRecordStore::insert(&store, &record).await.unwrap();

        assert!(!store.rotate_tokens(10, "stale", "a2", "r2", 5).await.unwrap());
        assert!(store.rotate_tokens(10, "r1", "a2", "r2", 5).await.unwrap());
        assert!(!store.rotate_tokens(10, "r1", "a3", "r3", 6).await.unwrap());

        let stored = store.find(10).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, "r2");
        assert_eq!(stored.updated_at, 5);
    }

    #[tokio::test]
    async fn delete_for_user_counts_removed_records() {
        let store = MemoryStore::new();
        let a = store.insert_user(NewUser::new("A", "a@example.com", "h"));
        let b = store.insert_user(NewUser::new("B", "b@example.com", "h"));
        for (id, user_id) in [(1, a), (2, a), (3, b)] {
            let record = CredentialRecord {
                id,
                user_id,
                access_token: String::new(),
                refresh_token: String::new(),
                device_type: None,
                device_token: None,
                platform: None,
                created_at: 0,
                updated_at: 0,
            };
            CredentialRecordStore::insert(&store, &record).await.unwrap();
        }

        assert_eq!(store.delete_for_user(a).await.unwrap(), 2);
        assert_eq!(store.record_count_for(a), 0);
        assert_eq!(store.record_count_for(b), 1);
    }
}
