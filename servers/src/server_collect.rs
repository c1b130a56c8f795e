//! # PlayStream Collector
//!
//! Local development collector for the state-streaming client. Exposes a
//! plain WebSocket endpoint at `/ws` that accepts one JSON snapshot per text
//! frame and logs it, plus a `/health` probe. The production collector lives
//! elsewhere; this binary exists so the client, the simulator, and the
//! integration tests can be exercised against a real endpoint on localhost.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use axum::{
    Router,
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use clap::Parser;
use lib_common::Snapshot;
use serde::{Deserialize, Serialize};
use tokio::signal;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "PlayStream local collector server", version)]
#[serde(rename_all = "camelCase")]
struct Config {
    #[clap(long, env = "COLLECT_PORT", help = "Port to listen on for client connections.")]
    port: Option<u16>,

    #[clap(long, env = "COLLECT_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    config_path: Option<PathBuf>,

    #[clap(long, env = "COLLECT_LOG_DIR", help = "Directory for log files.")]
    log_dir: Option<PathBuf>,

    #[clap(long, env = "COLLECT_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    log_level: Option<String>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }
}

fn load_config() -> Config {
    // 1. Load defaults. Port 8508 matches the client's default endpoint.
    let default_config = Config {
        port: Some(8508),
        log_dir: Some(PathBuf::from("./logs")),
        log_level: Some("info".to_string()),
        ..Default::default()
    };

    // 2. Load from config file (server_collect.conf) if present.
    //    Allow overriding the config file path with a CLI arg.
    let cli_args = Config::parse();
    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("server_collect.conf"));

    let mut current_config = default_config;

    if config_file_path.exists() {
        match fs::read_to_string(&config_file_path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str::<Config>(&s).map_err(anyhow::Error::from))
        {
            Ok(file_config) => current_config = current_config.merge(file_config),
            Err(e) => eprintln!(
                "Failed to load config file {}: {}. Falling back to other sources.",
                config_file_path.display(),
                e
            ),
        }
    }

    // 3. Override with environment variables and CLI arguments.
    current_config.merge(cli_args)
}

/// Shared counters for all collector connections.
struct AppState {
    /// Connections accepted since startup.
    connections: AtomicUsize,
    /// Snapshot frames received since startup.
    frames: AtomicU64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config();
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"));
    let log_level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    lib_common::setup_logging("server_collect", &log_dir, &log_level)?;

    let port = config.port.unwrap_or(8508);
    let shared_state = Arc::new(AppState {
        connections: AtomicUsize::new(0),
        frames: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .with_state(Arc::clone(&shared_state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("Collector listening on ws://{addr}/ws");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    log::info!(
        "Collector shut down. {} connection(s), {} frame(s) received.",
        shared_state.connections.load(Ordering::SeqCst),
        shared_state.frames.load(Ordering::SeqCst)
    );
    Ok(())
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

/// One producer session: read text frames, parse them as snapshots, log them.
/// Nothing is ever written back; the protocol is strictly one-way.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, addr: SocketAddr) {
    state.connections.fetch_add(1, Ordering::SeqCst);
    log::info!("Producer connected: {addr}");

    let mut session_frames: u64 = 0;
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                session_frames += 1;
                state.frames.fetch_add(1, Ordering::SeqCst);
                match serde_json::from_str::<Snapshot>(&text) {
                    Ok(snap) => log::info!(
                        "[{addr}] x={} y={} health={} inventory={:?} ts={:.3}",
                        snap.x,
                        snap.y,
                        snap.health,
                        snap.inventory,
                        snap.timestamp
                    ),
                    Err(e) => log::warn!("[{addr}] unparsable frame ({e}): {text}"),
                }
            }
            Message::Close(_) => break,
            // Axum answers pings itself; binary frames are not part of
            // the protocol.
            _ => {}
        }
    }

    log::info!("Producer disconnected: {addr} ({session_frames} frame(s))");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
