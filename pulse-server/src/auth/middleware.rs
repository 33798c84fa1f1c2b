//! Authentication and role middleware

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::HeaderMap;
use shared::AppError;
use shared::util::now_millis;

use super::codec::ClaimError;
use super::pipeline::AuthError;
use super::principal::Principal;
use super::roles::{self, RoleGroup, RoleSet};
use crate::security_log;
use crate::state::AppState;

/// What the `Authorization` header holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialHeader<'a> {
    /// Missing, blank, or a bare `Bearer`
    Absent,
    /// Present but not visible ASCII
    Unreadable,
    Present(&'a str),
}

impl CredentialHeader<'_> {
    /// Owned credential for the pipeline. An unreadable header is malformed,
    /// not absent.
    pub fn into_credential(self) -> Result<Option<String>, AuthError> {
        match self {
            Self::Absent => Ok(None),
            Self::Unreadable => Err(AuthError::MalformedToken(ClaimError::MalformedClaim(
                "credential header is not visible ASCII".to_string(),
            ))),
            Self::Present(value) => Ok(Some(value.to_owned())),
        }
    }
}

/// Raw credential from `Authorization`, with a leading `Bearer ` stripped.
pub fn extract_credential_header(headers: &HeaderMap) -> CredentialHeader<'_> {
    let Some(raw) = headers.get(http::header::AUTHORIZATION) else {
        return CredentialHeader::Absent;
    };
    match raw.to_str() {
        Err(_) => CredentialHeader::Unreadable,
        Ok(value) => match strip_bearer(value) {
            "" => CredentialHeader::Absent,
            token => CredentialHeader::Present(token),
        },
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim_start(),
        _ => value,
    }
}

/// Security log for a rejected request. Store failures are logged by the
/// `AppError` conversion instead.
pub(crate) fn log_rejection(err: &AuthError, method: &http::Method, path: &str) {
    match err {
        AuthError::Store(_) => {}
        AuthError::Forbidden { role_id } => {
            security_log!(
                "WARN",
                err.event(),
                method = %method,
                path = path,
                role_id = *role_id
            );
        }
        _ => {
            security_log!(
                "WARN",
                err.event(),
                method = %method,
                path = path,
                reason = %err
            );
        }
    }
}

/// Runs the verification pipeline and stores the [`Principal`] in request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let result = match extract_credential_header(req.headers()).into_credential() {
        Ok(header) => state.verifier.verify(header.as_deref(), now_millis()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            log_rejection(&e, req.method(), req.uri().path());
            Err(e.into())
        }
    }
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Allow only principals whose role id is in `allowed`
///
/// ```ignore
/// Router::new()
///     .route("/api/v1/admin/users/{id}/sessions", delete(admin::revoke_sessions))
///     .layer(middleware::from_fn(require_role_set(RoleSet::of(&[Role::SuperAdmin]))));
/// ```
pub fn require_role_set(allowed: RoleSet) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let allowed = Arc::new(allowed);
    move |req: Request, next: Next| -> MiddlewareFuture {
        let allowed = Arc::clone(&allowed);
        Box::pin(async move {
            let decision = roles::check_access(req.extensions().get::<Principal>(), &allowed);
            if let Err(e) = decision {
                log_rejection(&e, req.method(), req.uri().path());
                return Err(e.into());
            }
            Ok(next.run(req).await)
        })
    }
}

/// [`require_role_set`] over a named group
pub fn require_roles(group: RoleGroup) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    require_role_set(group.members().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn raw_and_bearer_forms() {
        assert_eq!(
            extract_credential_header(&headers("g.7.0.abc")),
            CredentialHeader::Present("g.7.0.abc")
        );
        assert_eq!(
            extract_credential_header(&headers("Bearer g.7.0.abc")),
            CredentialHeader::Present("g.7.0.abc")
        );
    }

    #[test]
    fn empty_or_missing_is_absent() {
        assert_eq!(extract_credential_header(&HeaderMap::new()), CredentialHeader::Absent);
        assert_eq!(extract_credential_header(&headers("")), CredentialHeader::Absent);
        assert_eq!(extract_credential_header(&headers("Bearer ")), CredentialHeader::Absent);
        assert_eq!(extract_credential_header(&headers("Bearer")), CredentialHeader::Absent);
        assert_eq!(CredentialHeader::Absent.into_credential().unwrap(), None);
    }

    #[test]
    fn token_that_merely_starts_with_bearer_is_kept() {
        assert_eq!(
            extract_credential_header(&headers("Bearerx.1.0.2")),
            CredentialHeader::Present("Bearerx.1.0.2")
        );
    }

    #[test]
    fn opaque_bytes_are_malformed_not_absent() {
        let mut map = HeaderMap::new();
        map.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_bytes(b"\xfftoken").unwrap(),
        );
        let header = extract_credential_header(&map);
        assert_eq!(header, CredentialHeader::Unreadable);
        assert!(matches!(
            header.into_credential(),
            Err(AuthError::MalformedToken(ClaimError::MalformedClaim(_)))
        ));
    }
}
