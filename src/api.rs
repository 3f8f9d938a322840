use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use futures::{Sink, SinkExt, StreamExt};
use metrics::gauge;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::broadcast::{BroadcastHub, ClientEvent, ServerEvent};
use crate::config::StreamConfig;
use crate::service::{LiveFeed, StateView};
use crate::tagging::DynTagOracle;

pub const DEFAULT_STATIC_DIR: &str = "static";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";

static NEXT_CLIENT_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<LiveFeed>,
    pub hub: BroadcastHub,
    pub static_dir: PathBuf,
}

impl AppState {
    /// Wires the feed to a fresh hub so every socket sees what the loops emit.
    pub fn new(cfg: StreamConfig, tagger: DynTagOracle, static_dir: PathBuf) -> Self {
        let hub = BroadcastHub::default();
        let feed = Arc::new(LiveFeed::new(cfg, tagger, Arc::new(hub.clone())));
        Self {
            feed,
            hub,
            static_dir,
        }
    }
}

pub fn static_dir_from_env() -> PathBuf {
    std::env::var(ENV_STATIC_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR))
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/api/state", get(api_state))
        .route("/ws", get(ws_handler))
        .nest_service("/static", assets)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Dashboard page, read from disk per request.
async fn index(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "index page unavailable");
            Err((StatusCode::NOT_FOUND, "index.html not found".to_string()))
        }
    }
}

async fn api_state(State(state): State<AppState>) -> Json<StateView> {
    Json(state.feed.state_view())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Subscribe before reading the snapshot: nothing falls between replay and live.
    let mut events = state.hub.subscribe();
    gauge!("connected_clients").set(state.hub.receiver_count() as f64);
    info!(target: "ws", client_id, "client connected");

    let mut open = true;
    for frame in state.feed.connect_greeting() {
        if send_event(&mut ws_tx, &frame).await.is_err() {
            open = false;
            break;
        }
    }

    while open {
        tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_client_text(&state, client_id, text.as_str()),
                Some(Ok(Message::Close(_))) | None => open = false,
                Some(Err(e)) => {
                    warn!(target: "ws", client_id, error = %e, "websocket error");
                    open = false;
                }
                Some(Ok(_)) => {} // Binary, Ping, Pong
            },
            ev = events.recv() => match ev {
                Ok(ev) => {
                    if send_event(&mut ws_tx, &ev).await.is_err() {
                        open = false;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(target: "ws", client_id, skipped = n, "client lagged, events dropped");
                }
                Err(RecvError::Closed) => open = false,
            },
        }
    }

    drop(events);
    gauge!("connected_clients").set(state.hub.receiver_count() as f64);
    info!(target: "ws", client_id, "client disconnected");
}

fn handle_client_text(state: &AppState, client_id: usize, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::StartStreams) => {
            state.feed.start_streams(&format!("client-{client_id}"));
        }
        Err(_) => {
            let head: String = text.chars().take(100).collect();
            warn!(target: "ws", client_id, frame = %head, "ignoring unparseable frame");
        }
    }
}

async fn send_event<S>(tx: &mut S, ev: &ServerEvent) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(ev).map_err(axum::Error::new)?;
    tx.send(Message::Text(json.into())).await
}
