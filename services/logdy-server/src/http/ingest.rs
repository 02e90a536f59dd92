use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use logdy_engine::parse_ingest_timestamp;
use logdy_protocol::{ErrorBody, LogIngestRequest, LogType, MessageOrigin};

use crate::state::AppState;

pub async fn ingest_log(State(state): State<Arc<AppState>>, Json(body): Json<LogIngestRequest>) -> Response {
    for item in &body.logs {
        let ts = match parse_ingest_timestamp(item.ts.as_deref()) {
            Ok(ts) => ts,
            Err(err) => {
                return (StatusCode::BAD_REQUEST, Json(ErrorBody::new(err.to_string()))).into_response();
            }
        };

        let origin = MessageOrigin::from_api_source(body.source.clone());
        if state
            .ingress
            .produce_at(item.log.clone(), LogType::Stdout, origin, ts)
            .await
            .is_err()
        {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("engine unavailable"))).into_response();
        }
    }
    StatusCode::ACCEPTED.into_response()
}
