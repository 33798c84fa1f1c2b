#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::response::Response;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use pulse_server::auth::codec::BASE36;
use pulse_server::auth::password::hash_password;
use pulse_server::store::TempCredential;
use pulse_server::store::memory::NewUser;
use pulse_server::{AppState, AuthConfig, BoxError, MemoryStore, ResetDelivery, Stores, create_router};
use serde_json::Value;
use shared::models::Role;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse";

/// Keeps every delivered reset token
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingDelivery {
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl ResetDelivery for RecordingDelivery {
    async fn deliver(&self, email: &str, credential: &TempCredential) -> Result<(), BoxError> {
        self.sent
            .lock()
            .push((email.to_owned(), credential.token.clone()));
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub delivery: Arc<RecordingDelivery>,
    router: Router,
}

impl TestApp {
    /// Unsigned base36 claims over an in-memory store
    pub fn new() -> Self {
        Self::with_config(AuthConfig {
            alphabet: BASE36.to_string(),
            ..AuthConfig::default()
        })
    }

    pub fn with_config(auth: AuthConfig) -> Self {
        let store = MemoryStore::new();
        let delivery = Arc::new(RecordingDelivery::default());
        let state = AppState::build(&auth, Stores::memory(store.clone()), delivery.clone())
            .expect("valid auth config");
        let router = create_router(state.clone());
        Self {
            state,
            store,
            delivery,
            router,
        }
    }

    pub fn seed(&self, id: i64, email: &str, role: Role) {
        let hash = hash_password(PASSWORD).expect("hash");
        self.store
            .insert_user_with_id(id, NewUser::new(format!("User {id}"), email, hash).role(role));
    }

    pub fn seed_inactive(&self, id: i64, email: &str) {
        let hash = hash_password(PASSWORD).expect("hash");
        self.store
            .insert_user_with_id(id, NewUser::new(format!("User {id}"), email, hash).inactive());
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self.send(request).await;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible")
    }

    pub async fn get(&self, uri: &str, authorization: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, authorization, None).await
    }

    pub async fn post(&self, uri: &str, authorization: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, authorization, Some(body)).await
    }

    /// Log in with [`PASSWORD`]; returns (access, refresh)
    pub async fn login(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/user/login",
                None,
                serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["data"]["accessToken"].as_str().expect("access").to_owned(),
            body["data"]["refreshToken"].as_str().expect("refresh").to_owned(),
        )
    }
}

pub fn error_code(body: &Value) -> u64 {
    body["error"]["code"].as_u64().unwrap_or_default()
}
