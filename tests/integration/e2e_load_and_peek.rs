//! `GET /api/client/load` and `POST /api/client/peek-log`, end to end.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use logdy_engine::{ClientsHub, Ingress};
use logdy_protocol::{LogType, MessageOrigin, VersionUpdateInfo, WsFrame};
use logdy_server::config::Config;
use logdy_server::state::AppState;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

fn test_config(port: u16) -> Config {
    Config {
        server_port: port,
        server_ip: "127.0.0.1".to_owned(),
        ui_pass: String::new(),
        api_key: String::new(),
        config_file_path: String::new(),
        http_path_prefix: "/".to_owned(),
        bulk_window_ms: 30,
        max_message_count: 1000,
        append_to_file: None,
        append_to_file_raw: false,
        append_to_file_rotate_max_size: None,
        analytics_disabled: true,
        fallthrough: false,
        disable_ansi_code_stripping: false,
    }
}

async fn start_server() -> (u16, Arc<Ingress>) {
    let (tx, rx) = mpsc::channel(1000);
    let ingress = Arc::new(Ingress::new(tx, false, true, None));
    let hub = ClientsHub::new(1000, Duration::from_millis(30));
    tokio::spawn(hub.clone().run(rx));

    let update_info = Arc::new(RwLock::new(VersionUpdateInfo::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let state = AppState::new(hub, ingress.clone(), test_config(port), update_info);
    let router = logdy_server::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    (port, ingress)
}

async fn next_frame(ws: &mut (impl StreamExt<Item = Result<TungsteniteMessage, tokio_tungstenite::tungstenite::Error>> + Unpin)) -> WsFrame {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        if let TungsteniteMessage::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn load_returns_inclusive_window_starting_at_given_index() {
    let (port, ingress) = start_server().await;
    for i in 1..=10 {
        ingress
            .produce(format!("msg-{i}"), LogType::Stdout, MessageOrigin::default())
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let url = format!("ws://127.0.0.1:{port}/ws?should_follow=false");
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    let joined = next_frame(&mut ws).await;
    let WsFrame::ClientJoined { client_id } = joined else {
        panic!("expected client_joined, got {joined:?}");
    };

    // Joining force-delivers the retained tail regardless of should_follow;
    // drain that batch (and its trailing status frame) before asserting on
    // the Load window.
    let tail = next_frame(&mut ws).await;
    let WsFrame::LogBulk { messages: tail_messages, .. } = tail else {
        panic!("expected join tail log_bulk, got {tail:?}");
    };
    assert_eq!(tail_messages.len(), 10);
    let _tail_status = next_frame(&mut ws).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!(
            "http://127.0.0.1:{port}/api/client/load?logdy-client-id={client_id}&start=3&count=4"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let loaded = next_frame(&mut ws).await;
    let WsFrame::LogBulk { messages, .. } = loaded else {
        panic!("expected log_bulk, got {loaded:?}");
    };
    assert_eq!(
        messages.iter().map(|m| m.content.clone()).collect::<Vec<_>>(),
        vec!["msg-3", "msg-4", "msg-5", "msg-6"]
    );

    ws.close(None).await.ok();
}

#[tokio::test]
async fn load_rejects_non_numeric_window() {
    let (port, _ingress) = start_server().await;
    let url = format!("ws://127.0.0.1:{port}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    let joined = next_frame(&mut ws).await;
    let WsFrame::ClientJoined { client_id } = joined else {
        panic!("expected client_joined");
    };

    let client = reqwest::Client::new();
    let resp = client
        .get(format!(
            "http://127.0.0.1:{port}/api/client/load?logdy-client-id={client_id}&start=nope&count=4"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    ws.close(None).await.ok();
}

#[tokio::test]
async fn peek_log_fetches_by_ring_index_skipping_out_of_range() {
    let (port, ingress) = start_server().await;
    for i in 0..5 {
        ingress
            .produce(format!("entry-{i}"), LogType::Stdout, MessageOrigin::default())
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let url = format!("ws://127.0.0.1:{port}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    let joined = next_frame(&mut ws).await;
    let WsFrame::ClientJoined { client_id } = joined else {
        panic!("expected client_joined");
    };

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/client/peek-log?logdy-client-id={client_id}"))
        .json(&serde_json::json!({"idxs": [0, 99, -1, 4]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let messages: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "entry-0");
    assert_eq!(messages[1]["content"], "entry-4");

    ws.close(None).await.ok();
}
