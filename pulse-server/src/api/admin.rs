//! Admin endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::{ApiResponse, AppError};

use super::user::ApiResult;
use crate::auth::principal::Principal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveResponse {
    pub user_id: i64,
    pub active: bool,
    pub sessions_revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: u64,
}

/// Enable or disable an account. Disabling also drops its sessions.
pub async fn set_active(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<SetActiveResponse> {
    if !state.subjects.set_active(user_id, req.active).await? {
        return Err(AppError::not_found("User"));
    }

    let sessions_revoked = if req.active {
        0
    } else {
        state.sessions.revoke_all(user_id).await?
    };

    tracing::info!(
        admin_id = principal.subject_id,
        user_id,
        active = req.active,
        sessions_revoked,
        "Account status changed"
    );

    Ok(ApiResponse::success(SetActiveResponse {
        user_id,
        active: req.active,
        sessions_revoked,
    }))
}

pub async fn revoke_sessions(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<i64>,
) -> ApiResult<RevokeResponse> {
    let revoked = state.sessions.revoke_all(user_id).await?;
    tracing::info!(admin_id = principal.subject_id, user_id, revoked, "Sessions revoked");
    Ok(ApiResponse::success(RevokeResponse { revoked }))
}
