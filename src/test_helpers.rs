//! In-process mock backend for tests: REST envelope routes plus a
//! WebSocket endpoint that relays `message:received` after every POST.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{Json, Router};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::app::Route;
use crate::auth::SessionStore;
use crate::config::ChannelConfig;
use crate::net::{ApiClient, ConnectionManager, WsConnector};

pub struct Backend {
    /// Response body of the history route, served verbatim.
    pub history: Mutex<Value>,
    pub posted: Mutex<Vec<Value>>,
    /// Events received over the socket, as `{event, data}` values.
    pub socket_events: Mutex<Vec<Value>>,
    pub auth_headers: Mutex<Vec<Option<String>>>,
    pub history_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
    pub healthy: AtomicBool,
    /// When set, every REST route answers this status with an error envelope.
    pub forced_status: Mutex<Option<u16>>,
    relay: broadcast::Sender<String>,
}

impl Backend {
    fn new() -> Self {
        let (relay, _) = broadcast::channel(64);
        Self {
            history: Mutex::new(json!({"success": true, "data": []})),
            posted: Mutex::default(),
            socket_events: Mutex::default(),
            auth_headers: Mutex::default(),
            history_calls: AtomicUsize::new(0),
            post_calls: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            forced_status: Mutex::new(None),
            relay,
        }
    }

    pub fn set_history(&self, messages: Value) {
        *self.history.lock().unwrap() = json!({"success": true, "data": messages});
    }

    pub fn force_status(&self, status: u16) {
        *self.forced_status.lock().unwrap() = Some(status);
    }

    /// Push an event to every connected socket.
    pub fn broadcast(&self, event: &str, data: Value) {
        let _ = self.relay.send(json!({"event": event, "data": data}).to_string());
    }

    pub fn socket_clients(&self) -> usize {
        self.relay.receiver_count()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned);
        self.auth_headers.lock().unwrap().push(value);
    }

    fn forced(&self) -> Option<Response> {
        let status = (*self.forced_status.lock().unwrap())?;
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "success": false,
            "error": {"code": "E_FORCED", "message": "Forced failure", "timestamp": "2024-05-01T10:00:00Z"}
        });
        Some((code, Json(body)).into_response())
    }
}

pub struct MockServer {
    pub backend: Arc<Backend>,
    pub addr: SocketAddr,
}

impl MockServer {
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn socket_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub async fn spawn_backend() -> MockServer {
    let backend = Arc::new(Backend::new());
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/chat/messages/history", get(history))
        .route("/api/chat/messages", post(post_message))
        .route("/ws", get(upgrade))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    MockServer { backend, addr }
}

/// Route channel, session store and API client pointed at `server`.
pub fn api_client(server: &MockServer) -> (Arc<ApiClient>, Arc<SessionStore>, tokio::sync::watch::Receiver<Route>) {
    let session = Arc::new(SessionStore::new());
    let (route_tx, route_rx) = tokio::sync::watch::channel(Route::Chat);
    let api = ApiClient::new(&server.api_url(), std::time::Duration::from_secs(5), session.clone(), Arc::new(route_tx))
        .expect("api client");
    (Arc::new(api), session, route_rx)
}

pub fn channel(server: &MockServer) -> Arc<ConnectionManager> {
    let config = ChannelConfig { reconnect_delay: std::time::Duration::from_millis(20), max_reconnect_attempts: 5 };
    Arc::new(ConnectionManager::new(server.socket_url(), config, Arc::new(WsConnector)))
}

// =============================================================================
// ROUTES
// =============================================================================

async fn health(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.record_auth(&headers);
    if let Some(forced) = backend.forced() {
        return forced;
    }
    let healthy = backend.healthy.load(Ordering::SeqCst);
    Json(json!({"success": healthy, "data": {"status": if healthy { "ok" } else { "down" }}})).into_response()
}

async fn history(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.record_auth(&headers);
    backend.history_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(forced) = backend.forced() {
        return forced;
    }
    let body = backend.history.lock().unwrap().clone();
    Json(body).into_response()
}

async fn post_message(State(backend): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend.record_auth(&headers);
    backend.post_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(forced) = backend.forced() {
        return forced;
    }
    backend.posted.lock().unwrap().push(body.clone());
    backend.broadcast(events::MESSAGE_RECEIVED, body.clone());
    (StatusCode::CREATED, Json(json!({"success": true, "data": body}))).into_response()
}

async fn upgrade(State(backend): State<Arc<Backend>>, headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
    backend.record_auth(&headers);
    ws.on_upgrade(move |socket| run_ws(socket, backend))
}

async fn run_ws(mut socket: WebSocket, backend: Arc<Backend>) {
    let mut relay = backend.relay.subscribe();
    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        if let Ok(value) = serde_json::from_str::<Value>(text.as_str()) {
                            backend.socket_events.lock().unwrap().push(value);
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = relay.recv() => {
                let Ok(frame) = frame else { break };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

// =============================================================================
// WAITING
// =============================================================================

/// Poll `cond` until it holds, panicking after two seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Connect `channel` and wait until the backend has subscribed the socket.
pub async fn connect_channel(server: &MockServer, channel: &Arc<ConnectionManager>, token: Option<&str>) {
    let before = server.backend.socket_clients();
    channel.connect(token.map(str::to_owned));
    wait_until(|| channel.is_connected() && server.backend.socket_clients() > before).await;
}
