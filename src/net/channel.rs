//! Realtime channel: one live connection with bounded reconnect.
//!
//! DESIGN
//! ======
//! `ConnectionManager` is constructed once and shared by `Arc`. It owns:
//! - a listener registry keyed by event name (insertion-ordered)
//! - the connection state (connected flag, retry counter, outbound sender)
//! - one supervisor task per `connect()` that dials, pumps inbound events
//!   and redials after a fixed delay
//!
//! Inbound events are dispatched through the live registry, so listeners
//! registered before a connection exists, or while it is down, receive
//! events on every later connection without re-subscribing.
//!
//! LIFECYCLE
//! =========
//! 1. `connect()` spawns the supervisor (no-op when connected or dialing)
//! 2. Success → `connect` dispatched, retry counter reset
//! 3. Drop → `disconnect` dispatched, redial after the delay
//! 4. Dial failure → `connect_error` dispatched; the 5th consecutive failure
//!    tears the supervisor down for good
//! 5. `disconnect()` aborts the supervisor; listeners stay registered
//!
//! Locks are never held across `.await` or while listeners run.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use events::Event;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ChannelConfig;

/// Outbound queue depth per connection.
pub const OUTBOUND_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connection rejected: unauthorized")]
    Unauthorized,
    #[error("invalid socket url: {0}")]
    InvalidUrl(String),
}

// =============================================================================
// TRANSPORT SEAM
// =============================================================================

/// An established connection: decoded inbound events and an outbound queue.
///
/// The inbound receiver yielding `None` means the transport closed.
pub struct Session {
    pub inbound: mpsc::Receiver<Event>,
    pub outbound: mpsc::Sender<Event>,
}

/// Dials the realtime endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str, token: Option<&str>) -> Result<Session, ChannelError>;
}

// =============================================================================
// LISTENERS
// =============================================================================

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    by_event: HashMap<String, Vec<(ListenerId, Listener)>>,
}

#[derive(Default)]
struct ConnState {
    connected: bool,
    attempts: u32,
    generation: u64,
    outbound: Option<mpsc::Sender<Event>>,
    supervisor: Option<JoinHandle<()>>,
}

// =============================================================================
// MANAGER
// =============================================================================

pub struct ConnectionManager {
    url: String,
    config: ChannelConfig,
    connector: Arc<dyn Connector>,
    registry: Mutex<Registry>,
    state: Mutex<ConnState>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(url: impl Into<String>, config: ChannelConfig, connector: Arc<dyn Connector>) -> Self {
        Self { url: url.into(), config, connector, registry: Mutex::default(), state: Mutex::default() }
    }

    /// Open the connection unless one is live or being dialed.
    pub fn connect(self: &Arc<Self>, token: Option<String>) {
        let mut state = self.lock_state();
        if state.connected || state.supervisor.as_ref().is_some_and(|task| !task.is_finished()) {
            tracing::debug!(url = %self.url, "connect ignored; connection already active");
            return;
        }
        state.generation += 1;
        state.attempts = 0;
        let generation = state.generation;
        let manager = Arc::clone(self);
        state.supervisor = Some(tokio::spawn(async move { manager.supervise(token, generation).await }));
    }

    /// Tear down the active connection. Registered listeners are kept.
    pub fn disconnect(&self) {
        let was_connected = {
            let mut state = self.lock_state();
            state.generation += 1;
            if let Some(task) = state.supervisor.take() {
                task.abort();
            }
            state.outbound = None;
            std::mem::take(&mut state.connected)
        };
        if was_connected {
            tracing::info!(url = %self.url, "channel disconnected by client");
            self.dispatch(events::DISCONNECT, &Value::String("client disconnect".to_owned()));
        }
    }

    /// Send an event on the live connection. Returns `false` (and drops the
    /// event) when disconnected.
    pub fn emit(&self, event: &str, data: Value) -> bool {
        let outbound = {
            let state = self.lock_state();
            if state.connected { state.outbound.clone() } else { None }
        };
        let Some(outbound) = outbound else {
            tracing::warn!(event, "emit while disconnected; event dropped");
            return false;
        };
        match outbound.try_send(Event::new(event, data)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(event, error = %e, "emit failed; event dropped");
                false
            }
        }
    }

    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut registry = self.lock_registry();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry.by_event.entry(event.to_owned()).or_default().push((id, Arc::new(callback)));
        id
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut registry = self.lock_registry();
        let Some(listeners) = registry.by_event.get_mut(event) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            registry.by_event.remove(event);
        }
        removed
    }

    pub fn off_all(&self, event: &str) {
        self.lock_registry().by_event.remove(event);
    }

    /// Drop every listener. Used on logout.
    pub fn clear_all_listeners(&self) {
        self.lock_registry().by_event.clear();
    }

    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.lock_registry().by_event.get(event).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.lock_state().connected
    }

    /// Consecutive failed dials since the last successful connect.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.lock_state().attempts
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    // -------------------------------------------------------------------------
    // Supervisor
    // -------------------------------------------------------------------------

    async fn supervise(self: Arc<Self>, token: Option<String>, generation: u64) {
        let connection_id = Uuid::new_v4();
        loop {
            match self.connector.connect(&self.url, token.as_deref()).await {
                Ok(session) => {
                    if !self.mark_open(generation, session.outbound) {
                        return;
                    }
                    tracing::info!(%connection_id, url = %self.url, "channel connected");
                    self.dispatch(events::CONNECT, &Value::Null);

                    let reason = self.pump(session.inbound).await;

                    if !self.mark_closed(generation) {
                        return;
                    }
                    tracing::warn!(%connection_id, %reason, "channel dropped");
                    self.dispatch(events::DISCONNECT, &Value::String(reason));
                }
                Err(e) => {
                    let Some(attempts) = self.record_failure(generation) else {
                        return;
                    };
                    tracing::warn!(%connection_id, attempts, error = %e, "channel connect failed");
                    self.dispatch(events::CONNECT_ERROR, &Value::String(e.to_string()));
                    if attempts >= self.config.max_reconnect_attempts {
                        tracing::error!(%connection_id, attempts, "giving up on channel after repeated failures");
                        self.give_up(generation);
                        return;
                    }
                }
            }
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    async fn pump(&self, mut inbound: mpsc::Receiver<Event>) -> String {
        while let Some(event) = inbound.recv().await {
            self.dispatch(&event.event, &event.data);
        }
        "transport closed".to_owned()
    }

    fn mark_open(&self, generation: u64, outbound: mpsc::Sender<Event>) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        state.connected = true;
        state.attempts = 0;
        state.outbound = Some(outbound);
        true
    }

    fn mark_closed(&self, generation: u64) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        state.connected = false;
        state.outbound = None;
        true
    }

    fn record_failure(&self, generation: u64) -> Option<u32> {
        let mut state = self.lock_state();
        if state.generation != generation {
            return None;
        }
        state.attempts += 1;
        Some(state.attempts)
    }

    fn give_up(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation == generation {
            state.connected = false;
            state.outbound = None;
            state.supervisor = None;
        }
    }

    /// Invoke every listener for `event` in registration order.
    fn dispatch(&self, event: &str, data: &Value) {
        let listeners: Vec<Listener> = self
            .lock_registry()
            .by_event
            .get(event)
            .map(|entries| entries.iter().map(|(_, callback)| Arc::clone(callback)).collect())
            .unwrap_or_default();
        if listeners.is_empty() {
            tracing::trace!(event, "no listeners for event");
        }
        for callback in listeners {
            callback(data);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
