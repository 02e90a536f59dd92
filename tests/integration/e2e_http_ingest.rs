//! `POST /api/log` ingestion and its bearer-auth gate, end to end.

use std::sync::Arc;
use std::time::Duration;

use logdy_engine::{ClientsHub, Ingress};
use logdy_protocol::VersionUpdateInfo;
use logdy_server::config::Config;
use logdy_server::state::AppState;
use tokio::sync::{mpsc, RwLock};

fn test_config(port: u16, api_key: &str) -> Config {
    Config {
        server_port: port,
        server_ip: "127.0.0.1".to_owned(),
        ui_pass: String::new(),
        api_key: api_key.to_owned(),
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

async fn start_server(api_key: &str) -> (u16, Arc<ClientsHub>) {
    let (tx, rx) = mpsc::channel(1000);
    let ingress = Arc::new(Ingress::new(tx, false, true, None));
    let hub = ClientsHub::new(1000, Duration::from_millis(30));
    tokio::spawn(hub.clone().run(rx));

    let update_info = Arc::new(RwLock::new(VersionUpdateInfo::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let state = AppState::new(hub.clone(), ingress, test_config(port, api_key), update_info);
    let router = logdy_server::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    (port, hub)
}

#[tokio::test]
async fn missing_bearer_prefix_is_rejected_with_400() {
    let (port, _hub) = start_server("secret123").await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/log"))
        .header("Authorization", "secret123")
        .json(&serde_json::json!({"source": "test", "logs": [{"log": "hi"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Bearer"));
}

#[tokio::test]
async fn wrong_key_is_rejected_with_401() {
    let (port, _hub) = start_server("secret123").await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/log"))
        .header("Authorization", "Bearer wrong")
        .json(&serde_json::json!({"source": "test", "logs": [{"log": "hi"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid api key");
}

#[tokio::test]
async fn no_configured_key_rejects_with_401() {
    let (port, _hub) = start_server("").await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/log"))
        .header("Authorization", "Bearer anything")
        .json(&serde_json::json!({"source": "test", "logs": [{"log": "hi"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Configure api key to access this endpoint");
}

#[tokio::test]
async fn valid_key_ingests_and_lands_in_the_ring() {
    let (port, hub) = start_server("secret123").await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/log"))
        .header("Authorization", "Bearer secret123")
        .json(&serde_json::json!({"source": "my-app", "logs": [{"log": "hello from api"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let messages = hub.peek_log(&[0]).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello from api");
    assert_eq!(messages[0].origin.as_ref().unwrap().api_source, "my-app");
}

#[tokio::test]
async fn unparsable_timestamp_fails_the_request() {
    let (port, _hub) = start_server("secret123").await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{port}/api/log"))
        .header("Authorization", "Bearer secret123")
        .json(&serde_json::json!({"source": "test", "logs": [{"ts": "not-a-time", "log": "hi"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
