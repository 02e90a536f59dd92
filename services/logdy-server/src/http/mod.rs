//! REST handlers that sit alongside the WebSocket gateway.

mod check_pass;
mod client_ops;
mod ingest;
mod status;

pub use check_pass::check_pass;
pub use client_ops::{load, peek_log, set_status};
pub use ingest::ingest_log;
pub use status::status;

/// Extracts the client id from the `logdy-client-id` header, falling back
/// to the identically-named query parameter.
pub(crate) fn client_id_from_request(
    headers: &axum::http::HeaderMap,
    query: &std::collections::HashMap<String, String>,
) -> Option<String> {
    headers
        .get("logdy-client-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .filter(|s| !s.is_empty())
        .or_else(|| query.get("logdy-client-id").cloned())
        .filter(|s| !s.is_empty())
}
