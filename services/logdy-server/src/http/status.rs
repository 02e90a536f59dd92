use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use logdy_protocol::WsFrame;

use crate::state::AppState;

pub async fn status(State(state): State<Arc<AppState>>) -> Json<WsFrame> {
    let config_str = if state.config.config_file_path.is_empty() {
        String::new()
    } else {
        std::fs::read_to_string(&state.config.config_file_path).unwrap_or_default()
    };

    let update_version = state.update_info.read().await.clone();

    Json(WsFrame::Init {
        analytics_enabled: !state.config.analytics_disabled,
        auth_required: !state.config.ui_pass.is_empty(),
        config_str,
        api_prefix: state.config.http_path_prefix.clone(),
        update_version,
    })
}
