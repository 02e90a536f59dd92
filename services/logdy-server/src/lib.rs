//! Router composition for the logdy HTTP/WebSocket surface.

pub mod auth;
pub mod config;
pub mod http;
pub mod state;
mod static_ui;
pub mod ws;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let trimmed_prefix = state.config.http_path_prefix.trim_matches('/').to_owned();

    let ingest_router = Router::new()
        .route("/api/log", post(http::ingest_log))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    let api_router = Router::new()
        .route("/api/check-pass", get(http::check_pass))
        .route("/api/status", get(http::status))
        .route("/api/client/set-status", get(http::set_status))
        .route("/api/client/load", get(http::load))
        .route("/api/client/peek-log", post(http::peek_log))
        .route("/ws", get(ws::ws_handler))
        .merge(ingest_router);

    let router = if trimmed_prefix.is_empty() {
        Router::new().merge(api_router)
    } else {
        Router::new().nest(&format!("/{trimmed_prefix}"), api_router)
    };

    router.fallback(static_ui::serve_ui).with_state(state)
}
