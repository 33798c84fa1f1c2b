//! Request logging middleware
//!
//! Logs each request with credential-bearing headers masked and every failed
//! response with method, path, status and message. Health checks and static
//! uploads are not logged on success.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderMap;
use shared::AppError;

const MASKED_HEADERS: [&str; 3] = ["authorization", "cookie", "set-cookie"];
const QUIET_PREFIXES: [&str; 3] = ["/uploads", "/api/v1/health", "/health"];

pub fn is_quiet_path(path: &str) -> bool {
    QUIET_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Header dump with credential values replaced by `***`
pub fn masked_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = name.as_str().to_string();
            let value = if MASKED_HEADERS.contains(&name.as_str()) {
                "***".to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name, value)
        })
        .collect()
}

/// X-Forwarded-For first entry, then the peer address
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    req.extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let quiet = is_quiet_path(&path);
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    if !quiet {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %req.uri(),
            ip = %client_ip(&req),
            headers = ?masked_headers(req.headers()),
            "Request started"
        );
    }

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if let Some(err) = response.extensions().get::<AppError>() {
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                code = %err.code,
                message = %err.message,
                latency_ms,
                "Request failed"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                code = %err.code,
                message = %err.message,
                latency_ms,
                "Request failed"
            );
        }
    } else if !quiet {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            "Request completed"
        );
    }

    response
}
