//! `Principal` extractor
//!
//! Reuses the principal stored by [`require_auth`](super::middleware::require_auth).
//! Handlers mounted without that layer still get a fully verified principal,
//! or the same rejection the layer would have produced.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::AppError;
use shared::util::now_millis;

use super::middleware::{extract_credential_header, log_rejection};
use super::principal::Principal;
use crate::state::AppState;

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let result = match extract_credential_header(&parts.headers).into_credential() {
            Ok(header) => state.verifier.verify(header.as_deref(), now_millis()).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(principal) => {
                parts.extensions.insert(principal.clone());
                Ok(principal)
            }
            Err(e) => {
                log_rejection(&e, &parts.method, parts.uri.path());
                Err(e.into())
            }
        }
    }
}
