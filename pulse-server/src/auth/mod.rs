//! Credential and authorization core
//!
//! - [`codec`]: alphabet encoding and composite split/join
//! - [`claims`]: 4-field access/refresh claim strings, optional HMAC tag
//! - [`pipeline`]: staged verification into a [`Principal`]
//! - [`roles`]: role groups and the membership check
//! - [`temp`]: single-use temp credentials
//! - [`session`]: login, refresh rotation, logout
//! - [`middleware`] / [`extractor`]: axum integration

pub mod claims;
pub mod codec;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod pipeline;
pub mod principal;
pub mod roles;
pub mod session;
pub mod temp;

pub use claims::{ClaimPurpose, ClaimSigner, Claims, CredentialFormat};
pub use codec::{Alphabet, ClaimCodec, ClaimError};
pub use middleware::{CredentialHeader, extract_credential_header, require_auth, require_role_set, require_roles};
pub use pipeline::{AuthError, CredentialVerifier};
pub use principal::Principal;
pub use roles::{RoleGroup, RoleSet, authorize, check_access};
pub use session::{IssuedSession, SessionError, SessionService};
pub use temp::{TempCredentialError, TempCredentialService};
