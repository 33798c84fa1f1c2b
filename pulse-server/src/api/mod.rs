//! HTTP surface
//!
//! Routes are grouped by the role group that may call them. Every group except
//! the public one sits behind [`require_auth`], which resolves the
//! [`Principal`](crate::auth::Principal) before the role check runs.

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
};
use http::{HeaderName, HeaderValue};
use shared::AppError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{RoleGroup, require_auth, require_roles};
use crate::state::AppState;

pub mod admin;
pub mod health;
pub mod logging;
pub mod user;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 per request
#[derive(Clone, Copy)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/user/login", post(user::login))
        .route("/api/v1/user/refresh", post(user::refresh))
        .route("/api/v1/user/forgot-password", post(user::forgot_password))
        .route("/api/v1/user/reset-password", post(user::reset_password))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/user/me", get(user::me))
        .route("/api/v1/user/logout", post(user::logout))
        .route_layer(from_fn(require_roles(RoleGroup::AllAuthenticated)))
}

fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/users/{id}/active", patch(admin::set_active))
        .route_layer(from_fn(require_roles(RoleGroup::AdminsAndAbove)))
}

fn superadmin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/users/{id}/sessions", delete(admin::revoke_sessions))
        .route_layer(from_fn(require_roles(RoleGroup::AdminOnly)))
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route")
}

/// Full application: routes, auth layers, logging and state
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(user_routes())
        .merge(staff_routes())
        .merge(superadmin_routes())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .fallback(route_not_found)
        .layer(from_fn(logging::log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            UuidRequestId,
        ))
        .with_state(state)
}
