use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use logdy_protocol::{ErrorBody, Message, PeekLogRequest};

use crate::http::client_id_from_request;
use crate::state::AppState;

fn bad_request(msg: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(msg))).into_response()
}

fn resolve_client_id(headers: &HeaderMap, query: &HashMap<String, String>) -> Result<String, Response> {
    client_id_from_request(headers, query).ok_or_else(|| bad_request("missing client id"))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let client_id = match resolve_client_id(&headers, &query) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let result = match query.get("status").map(String::as_str) {
        Some("following") => {
            state
                .hub
                .resume_following(&client_id, query.contains_key("from_cursor"))
                .await
        }
        Some("stopped") => state.hub.pause_following(&client_id).await,
        _ => return bad_request("unrecognized status"),
    };

    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => bad_request("unknown client id"),
    }
}

pub async fn load(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let client_id = match resolve_client_id(&headers, &query) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let Some(start) = query.get("start").and_then(|v| v.parse::<usize>().ok()) else {
        return bad_request("invalid start");
    };
    let Some(count) = query.get("count").and_then(|v| v.parse::<usize>().ok()) else {
        return bad_request("invalid count");
    };

    match state.hub.load(&client_id, start, count, true).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => bad_request("unknown client id"),
    }
}

pub async fn peek_log(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<PeekLogRequest>,
) -> Response {
    if let Err(resp) = resolve_client_id(&headers, &query) {
        return resp;
    }
    let messages: Vec<Message> = state.hub.peek_log(&body.idxs).await;
    Json(messages).into_response()
}
