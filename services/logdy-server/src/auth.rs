//! Bearer-token gate for `POST /api/log`.
//!
//! Mirrors the original's `apiKeyMiddleware`, but as a tower layer rather
//! than a per-handler wrapper, since that's the idiom this pack reaches for
//! around axum.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use logdy_protocol::ErrorBody;

use crate::state::AppState;

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(msg))).into_response()
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    if state.config.api_key.is_empty() {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Configure api key to access this endpoint",
        );
    }

    let raw = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let Some(key) = raw.strip_prefix("Bearer ") else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "should be prefixed with 'Bearer'",
        );
    };

    if key != state.config.api_key {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid api key");
    }

    next.run(request).await
}
