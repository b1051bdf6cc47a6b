//! Message synchronization: initial history over HTTP plus live updates
//! from the realtime channel, merged into one ordered list.
//!
//! DESIGN
//! ======
//! State lives in a `watch` channel so any number of views can observe it.
//! The hook registers three channel listeners on `activate` and removes
//! exactly those on `deactivate`. A `mounted` flag guards updates that land
//! after deactivation (late history responses, in-flight callbacks).
//!
//! The server is the only broadcaster of record: a sent message is never
//! appended locally and history is not reloaded after sending. The sender's
//! copy arrives through `message:received` like everyone else's.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::watch;

use super::message::{self, ChatMessage, ValidationError};
use crate::net::{ApiClient, ApiError, ConnectionManager, ListenerId};

pub const NOT_CONNECTED: &str = "Not connected to server";
pub const SEND_FAILED: &str = "Failed to send message";
pub const PARSE_FAILED: &str = "Failed to parse message";
const SOCKET_ERROR: &str = "Socket error";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Not connected to server")]
    NotConnected,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to send message: {0}")]
    Send(#[source] ApiError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ChatSync {
    api: Arc<ApiClient>,
    channel: Arc<ConnectionManager>,
    state: Arc<watch::Sender<ChatState>>,
    mounted: Arc<AtomicBool>,
    listeners: Mutex<Vec<(&'static str, ListenerId)>>,
    history_limit: usize,
    refresh_on_connect: bool,
}

impl ChatSync {
    #[must_use]
    pub fn new(
        api: Arc<ApiClient>,
        channel: Arc<ConnectionManager>,
        history_limit: usize,
        refresh_on_connect: bool,
    ) -> Self {
        Self {
            api,
            channel,
            state: Arc::new(watch::Sender::new(ChatState::default())),
            mounted: Arc::new(AtomicBool::new(false)),
            listeners: Mutex::new(Vec::new()),
            history_limit,
            refresh_on_connect,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Register channel listeners and load history once.
    pub async fn activate(&self) {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.register_listeners();
        self.load_history().await;
    }

    /// Remove this hook's listeners and ignore any late results.
    pub fn deactivate(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        let listeners = std::mem::take(&mut *self.listeners.lock().unwrap_or_else(PoisonError::into_inner));
        for (event, id) in listeners {
            self.channel.off(event, id);
        }
    }

    /// Replace the list with the latest history. Failures are logged and
    /// leave the list untouched.
    pub async fn load_history(&self) {
        load_history_into(&self.api, &self.state, &self.mounted, self.history_limit).await;
    }

    /// Persist a message over HTTP, then notify peers over the channel.
    ///
    /// # Errors
    ///
    /// [`ChatError::NotConnected`] without any HTTP call when the channel is
    /// down, [`ChatError::Validation`] for a bad draft, [`ChatError::Send`]
    /// when the POST fails.
    pub async fn send_message(&self, draft: &ChatMessage) -> Result<(), ChatError> {
        if !self.channel.is_connected() {
            self.set_error(Some(NOT_CONNECTED.to_owned()));
            return Err(ChatError::NotConnected);
        }

        if let Err(e) = message::validate(draft) {
            self.set_error(Some(e.to_string()));
            return Err(e.into());
        }
        let outbound = draft.sanitized();
        if outbound.text.trim().is_empty() {
            self.set_error(Some(ValidationError::EmptyMessage.to_string()));
            return Err(ValidationError::EmptyMessage.into());
        }

        if let Err(e) = self.api.post_message(&outbound).await {
            tracing::warn!(error = %e, "message send failed");
            self.set_error(Some(SEND_FAILED.to_owned()));
            return Err(ChatError::Send(e));
        }

        match serde_json::to_value(&outbound) {
            Ok(payload) => {
                self.channel.emit(events::MESSAGE_SEND, payload);
            }
            Err(e) => tracing::warn!(error = %e, "could not encode message for broadcast"),
        }
        self.set_error(None);
        Ok(())
    }

    pub fn clear_messages(&self) {
        self.state.send_modify(|state| {
            state.messages.clear();
            state.error = None;
        });
    }

    fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|state| state.error = error);
    }

    fn register_listeners(&self) {
        let mut ids = Vec::with_capacity(3);

        let (state, mounted) = (self.state.clone(), self.mounted.clone());
        ids.push((
            events::MESSAGE_RECEIVED,
            self.channel.on(events::MESSAGE_RECEIVED, move |data| {
                if mounted.load(Ordering::SeqCst) {
                    on_message_received(&state, data);
                }
            }),
        ));

        let (state, mounted) = (self.state.clone(), self.mounted.clone());
        ids.push((
            events::ERROR,
            self.channel.on(events::ERROR, move |data| {
                if !mounted.load(Ordering::SeqCst) {
                    return;
                }
                let message = error_message(data);
                tracing::warn!(%message, "channel reported error");
                state.send_modify(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
            }),
        ));

        let (state, mounted) = (self.state.clone(), self.mounted.clone());
        let api = self.api.clone();
        let (refresh, limit) = (self.refresh_on_connect, self.history_limit);
        ids.push((
            events::CONNECT,
            self.channel.on(events::CONNECT, move |_| {
                if !mounted.load(Ordering::SeqCst) {
                    return;
                }
                state.send_if_modified(|s| s.error.take().is_some());
                if refresh {
                    let (api, state, mounted) = (api.clone(), state.clone(), mounted.clone());
                    tokio::spawn(async move { load_history_into(&api, &state, &mounted, limit).await });
                }
            }),
        ));

        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).extend(ids);
    }
}

async fn load_history_into(api: &ApiClient, state: &watch::Sender<ChatState>, mounted: &AtomicBool, limit: usize) {
    state.send_modify(|s| s.loading = true);
    let result = api.fetch_history(limit).await;
    if !mounted.load(Ordering::SeqCst) {
        tracing::debug!("discarding history result after deactivation");
        state.send_modify(|s| s.loading = false);
        return;
    }
    match result {
        Ok(history) => {
            let messages: Vec<ChatMessage> = history.into_iter().map(ChatMessage::received).collect();
            tracing::debug!(count = messages.len(), "history loaded");
            state.send_modify(|s| {
                s.messages = messages;
                s.loading = false;
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "history fetch failed");
            state.send_modify(|s| s.loading = false);
        }
    }
}

fn on_message_received(state: &watch::Sender<ChatState>, data: &Value) {
    match ChatMessage::from_payload(data) {
        Ok(message) => {
            let message = message.received();
            state.send_modify(|s| s.messages.push(message));
        }
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed message payload");
            state.send_modify(|s| s.error = Some(PARSE_FAILED.to_owned()));
        }
    }
}

fn error_message(data: &Value) -> String {
    match data {
        Value::String(message) if !message.is_empty() => message.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| SOCKET_ERROR.to_owned(), str::to_owned),
        _ => SOCKET_ERROR.to_owned(),
    }
}
