//! User Model

use serde::{Deserialize, Serialize};

use super::role::RoleRef;

/// Public user profile (no password, no flags the client cannot act on)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub user_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub role: RoleRef,
}

/// Device metadata sent with a login
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_type: Option<String>,
    pub device_token: Option<String>,
    pub platform: Option<String>,
}
