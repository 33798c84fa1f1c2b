//! Authenticated request context

use serde::Serialize;
use shared::models::{RoleRef, UserProfile};

use super::claims::Claims;
use crate::store::Subject;

/// Result of a successful verification, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub subject_id: i64,
    pub credential_record_id: i64,
    pub name: String,
    pub email: String,
    pub user_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub role: RoleRef,
}

impl Principal {
    pub fn new(claims: &Claims, subject: Subject) -> Self {
        Self {
            subject_id: subject.id,
            credential_record_id: claims.credential_record_id,
            name: subject.name,
            email: subject.email,
            user_name: subject.user_name,
            profile_image: subject.profile_image,
            is_verified: subject.is_verified,
            role: subject.role,
        }
    }

    pub fn role_id(&self) -> i32 {
        self.role.id
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.subject_id,
            name: self.name.clone(),
            email: self.email.clone(),
            user_name: self.user_name.clone(),
            profile_image: self.profile_image.clone(),
            is_verified: self.is_verified,
            role: self.role.clone(),
        }
    }
}
