use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use logdy_engine::{ClientsHub, Ingress, RotatingSink};
use logdy_protocol::VersionUpdateInfo;
use logdy_server::config::{Cli, Config, SourceCommand};
use logdy_server::state::AppState;
use logdy_updater::{run_update_checker, GithubReleaseSource};
use tokio::sync::{mpsc, RwLock};
use tracing_subscriber::EnvFilter;

const LOCAL_VERSION: &str = env!("CARGO_PKG_VERSION");
const UPDATE_REPO_OWNER: &str = "logdyhq";
const UPDATE_REPO_NAME: &str = "logdy-core";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let source = cli.source.clone();
    let config = match Config::resolve(cli) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let sink = match &config.append_to_file {
        Some(path) => match RotatingSink::open(
            path.clone(),
            config.append_to_file_raw,
            config.append_to_file_rotate_max_size,
            3,
        ) {
            Ok(sink) => Some(Arc::new(tokio::sync::Mutex::new(sink))),
            Err(err) => {
                tracing::error!(error = %err, "failed to open append-to-file sink");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let (ingest_tx, ingest_rx) = mpsc::channel(1000);
    let ingress = Arc::new(Ingress::new(
        ingest_tx,
        config.fallthrough,
        !config.disable_ansi_code_stripping,
        sink,
    ));

    let bulk_window = Duration::from_millis(config.bulk_window_ms.max(1));
    let hub = ClientsHub::new(config.max_message_count as usize, bulk_window);
    tokio::spawn(hub.clone().run(ingest_rx));

    let update_info = Arc::new(RwLock::new(VersionUpdateInfo::default()));
    tokio::spawn(run_update_checker(
        Arc::new(GithubReleaseSource::new(UPDATE_REPO_OWNER, UPDATE_REPO_NAME)),
        LOCAL_VERSION.to_owned(),
        update_info.clone(),
    ));

    spawn_source(source, ingress.clone());

    let bind_addr = format!("{}:{}", config.server_ip, config.server_port);
    let state = AppState::new(hub, ingress, config, update_info);
    let router = logdy_server::build_router(state);

    tracing::info!(addr = %bind_addr, "starting logdy");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, router).await {
        tracing::error!(error = %err, "server exited");
        std::process::exit(1);
    }
}

fn spawn_source(source: Option<SourceCommand>, ingress: Arc<Ingress>) {
    match source {
        None => {}
        Some(SourceCommand::Stdin) => {
            tokio::spawn(logdy_sources::run_stdin_reader(ingress));
        }
        Some(SourceCommand::Exec { command }) => {
            let Some((program, args)) = command.split_first() else {
                tracing::error!("exec requires a program name");
                return;
            };
            let program = program.clone();
            let args = args.to_vec();
            tokio::spawn(async move {
                if let Err(err) = logdy_sources::run_child_process(ingress, &program, &args).await {
                    tracing::error!(error = %err, "child process source failed");
                }
            });
        }
        Some(SourceCommand::Tcp { port }) => {
            let addr = format!("0.0.0.0:{port}");
            tokio::spawn(async move {
                if let Err(err) = logdy_sources::run_tcp_listener(ingress, &addr).await {
                    tracing::error!(error = %err, "tcp source failed");
                }
            });
        }
        Some(SourceCommand::Tail { path, from_beginning }) => {
            tokio::spawn(async move {
                let path = std::path::Path::new(&path);
                if let Err(err) = logdy_sources::run_file_tailer(ingress, path, from_beginning).await {
                    tracing::error!(error = %err, "file tailer failed");
                }
            });
        }
        Some(SourceCommand::Demo { interval_ms }) => {
            tokio::spawn(logdy_sources::run_demo_generator(
                ingress,
                Duration::from_millis(interval_ms.max(1)),
            ));
        }
    }
}
