//! User endpoints: login, refresh, logout, profile, password reset

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::models::{DeviceInfo, UserProfile};
use shared::util::now_millis;
use shared::{ApiResponse, AppError, ErrorCode};

use crate::auth::IssuedSession;
use crate::auth::password::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, hash_password};
use crate::auth::principal::Principal;
use crate::state::AppState;

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub device: DeviceInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    pub sessions_revoked: u64,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<IssuedSession> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let session = state
        .sessions
        .login(req.email.trim(), &req.password, req.device, now_millis())
        .await?;
    Ok(ApiResponse::success_with_message("Login successful", session))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<IssuedSession> {
    let session = state
        .sessions
        .refresh(&req.refresh_token, now_millis())
        .await?;
    Ok(ApiResponse::success_with_message("Token refreshed", session))
}

pub async fn logout(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<LogoutResponse> {
    let logged_out = state.sessions.logout(&principal).await?;
    Ok(ApiResponse::success_with_message(
        "Logged out",
        LogoutResponse { logged_out },
    ))
}

pub async fn me(principal: Principal) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(principal.profile()))
}

/// Always answers OK so the endpoint cannot be used to enumerate accounts
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<()> {
    let email = req.email.trim();
    let account = state.subjects.find_login_account(email).await?;

    match account {
        Some(account) if account.active => {
            let credential = state
                .temp_credentials
                .issue(account.subject_id, now_millis())
                .await?;
            if let Err(e) = state.reset_delivery.deliver(email, &credential).await {
                tracing::error!(error = %e, user_id = account.subject_id, "Reset delivery failed");
            }
        }
        Some(account) => {
            tracing::info!(user_id = account.subject_id, "Reset requested for inactive account");
        }
        None => {
            tracing::debug!("Reset requested for unknown email");
        }
    }

    Ok(ApiResponse::success_with_message(
        "If the account exists, reset instructions have been sent",
        (),
    ))
}

/// Redeem a temp credential, set the new password and drop every session
fn new_password_hash(password: &str) -> Result<String, AppError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort).with_detail("minLength", MIN_PASSWORD_LEN));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        ))
        .with_detail("maxLength", MAX_PASSWORD_LEN));
    }
    hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::new(ErrorCode::InternalError)
    })
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<ResetPasswordResponse> {
    // Everything that can reject the new password runs before the token burns
    let hash = new_password_hash(&req.password)?;

    let subject_id = state
        .temp_credentials
        .redeem(&req.token, now_millis())
        .await?;

    if !state.subjects.update_password(subject_id, &hash).await? {
        return Err(AppError::new(ErrorCode::SubjectNotFound));
    }
    let sessions_revoked = state.sessions.revoke_all(subject_id).await?;

    tracing::info!(user_id = subject_id, sessions_revoked, "Password reset");

    Ok(ApiResponse::success_with_message(
        "Password has been reset",
        ResetPasswordResponse { sessions_revoked },
    ))
}
