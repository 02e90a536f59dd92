//! Full-stack follow/pause/resume over a real WebSocket connection.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
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
async fn follow_then_pause_then_resume_from_cursor_replays_gap() {
    let (port, ingress) = start_server().await;
    let url = format!("ws://127.0.0.1:{port}/ws?should_follow=true");
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let joined = next_frame(&mut ws).await;
    let WsFrame::ClientJoined { client_id } = joined else {
        panic!("expected client_joined, got {joined:?}");
    };

    ingress
        .produce("line-1", LogType::Stdout, MessageOrigin::default())
        .await
        .unwrap();
    ingress
        .produce("line-2", LogType::Stdout, MessageOrigin::default())
        .await
        .unwrap();

    let bulk = next_frame(&mut ws).await;
    let WsFrame::LogBulk { messages, .. } = bulk else {
        panic!("expected log_bulk, got {bulk:?}");
    };
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "line-1");
    let _status = next_frame(&mut ws).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!(
            "http://127.0.0.1:{port}/api/client/set-status?logdy-client-id={client_id}&status=stopped"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    ingress
        .produce("line-3", LogType::Stdout, MessageOrigin::default())
        .await
        .unwrap();
    ingress
        .produce("line-4", LogType::Stdout, MessageOrigin::default())
        .await
        .unwrap();

    let resp = client
        .get(format!(
            "http://127.0.0.1:{port}/api/client/set-status?logdy-client-id={client_id}&status=following&from_cursor"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let replay = next_frame(&mut ws).await;
    let WsFrame::LogBulk { messages, .. } = replay else {
        panic!("expected log_bulk replay, got {replay:?}");
    };
    assert_eq!(messages.iter().map(|m| m.content.clone()).collect::<Vec<_>>(), vec!["line-3", "line-4"]);

    ws.close(None).await.ok();
}
