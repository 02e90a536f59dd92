//! The WebSocket session: join, reader/writer split, status ticker.
//!
//! Every delivered batch writes `log_bulk` then `client_msg_status` as one
//! unit — the original holds a single mutex across both writes so a client
//! never observes a bulk without its trailing status. We get the same
//! effect by giving the writer side of the socket to one task and routing
//! every outbound frame through it.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use logdy_engine::CursorState;
use logdy_protocol::WsFrame;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::state::AppState;

const STATUS_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub should_follow: bool,
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JoinQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    if !state.config.ui_pass.is_empty() && query.password != state.config.ui_pass {
        return axum::http::StatusCode::FORBIDDEN.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.should_follow))
}

type WriteHalf = SplitSink<WebSocket, WsMessage>;

async fn send_frame(writer: &Mutex<WriteHalf>, frame: &WsFrame) -> bool {
    let Ok(json) = serde_json::to_string(frame) else {
        return false;
    };
    writer.lock().await.send(WsMessage::Text(json)).await.is_ok()
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, should_follow: bool) {
    let (sender, mut receiver) = socket.split();
    let writer = Arc::new(Mutex::new(sender));

    let (client_id, mut outbound) = state.hub.join(100, should_follow).await;
    tracing::info!(client_id = %client_id, "new web UI client connected");

    if !send_frame(
        &writer,
        &WsFrame::ClientJoined {
            client_id: client_id.clone(),
        },
    )
    .await
    {
        state.hub.close(&client_id).await;
        return;
    }

    let reader_hub = state.hub.clone();
    let reader_id = client_id.clone();
    let reader_task = tokio::spawn(async move {
        while receiver.next().await.is_some() {}
        reader_hub.close(&reader_id).await;
    });

    let ticker_hub = state.hub.clone();
    let ticker_id = client_id.clone();
    let ticker_writer = writer.clone();
    let ticker_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(STATUS_TICK).await;
            let Ok(CursorState::Stopped) = ticker_hub.cursor_state(&ticker_id).await else {
                continue;
            };
            let Ok(client) = ticker_hub.client_stats(&ticker_id).await else {
                break;
            };
            let stats = ticker_hub.stats().await;
            let frame = WsFrame::ClientMsgStatus { client, stats };
            if !send_frame(&ticker_writer, &frame).await {
                break;
            }
        }
    });

    while let Some(messages) = outbound.recv().await {
        let status = state.hub.stats().await;
        let bulk = WsFrame::LogBulk {
            messages,
            status: status.clone(),
        };
        if !send_frame(&writer, &bulk).await {
            break;
        }
        let Ok(client) = state.hub.client_stats(&client_id).await else {
            break;
        };
        if !send_frame(&writer, &WsFrame::ClientMsgStatus { client, stats: status }).await {
            break;
        }
    }

    reader_task.abort();
    ticker_task.abort();
    state.hub.close(&client_id).await;
    tracing::info!(client_id = %client_id, "closed client");
}
