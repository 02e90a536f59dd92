use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::state::AppState;

pub async fn check_pass(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    if state.config.ui_pass.is_empty() {
        return StatusCode::OK;
    }
    match query.get("password") {
        Some(pass) if *pass == state.config.ui_pass => StatusCode::OK,
        _ => StatusCode::FORBIDDEN,
    }
}
