//! Health check endpoints

use axum::extract::State;
use serde::Serialize;
use shared::ApiResponse;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let database = match &state.database {
        None => "memory",
        Some(pg) => match pg.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                "unreachable"
            }
        },
    };

    ApiResponse::success_with_message(
        "Server is healthy",
        HealthStatus {
            status: "ok",
            service: "pulse-server",
            version: env!("CARGO_PKG_VERSION"),
            database,
        },
    )
}
