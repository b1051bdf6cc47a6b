//! Shared event envelope and JSON codec for the realtime chat channel.
//!
//! This crate owns the wire representation used by the chat client and by
//! any backend (or test double) that speaks to it. Every WebSocket text frame
//! carries exactly one [`Event`]: a namespaced event name plus an arbitrary
//! JSON payload.
//!
//! Lifecycle names (`connect`, `disconnect`, `connect_error`) are never sent
//! on the wire. The client synthesizes them locally so consumers can listen
//! for connection changes through the same registry as remote events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// EVENT NAMES
// =============================================================================

/// Outbound notification that a message was persisted and peers should refresh.
pub const MESSAGE_SEND: &str = "message:send";
/// Inbound chat message broadcast by the server.
pub const MESSAGE_RECEIVED: &str = "message:received";
/// Server-reported error, payload is a human-readable string.
pub const ERROR: &str = "error";
/// Presence: a peer started typing. Reserved.
pub const TYPING_START: &str = "typing:start";
/// Presence: a peer stopped typing. Reserved.
pub const TYPING_STOP: &str = "typing:stop";
/// Presence: a peer joined. Reserved.
pub const USER_JOINED: &str = "user:joined";
/// Presence: a peer left. Reserved.
pub const USER_LEFT: &str = "user:left";

/// Local lifecycle: the connection was established.
pub const CONNECT: &str = "connect";
/// Local lifecycle: the connection dropped. Payload is the reason string.
pub const DISCONNECT: &str = "disconnect";
/// Local lifecycle: a connection attempt failed. Payload is the error string.
pub const CONNECT_ERROR: &str = "connect_error";

/// Returns `true` for names the client synthesizes locally.
#[must_use]
pub fn is_lifecycle(name: &str) -> bool {
    matches!(name, CONNECT | DISCONNECT | CONNECT_ERROR)
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned by [`decode_event`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text frame is not a JSON event object.
    #[error("failed to decode event: {0}")]
    Json(#[from] serde_json::Error),
    /// The `event` field is present but empty.
    #[error("event name is empty")]
    EmptyName,
    /// A remote peer tried to deliver a locally reserved lifecycle event.
    #[error("lifecycle event `{0}` cannot arrive over the wire")]
    Lifecycle(String),
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// A single message on the realtime wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Namespaced event name, e.g. `"message:received"`.
    pub event: String,
    /// Arbitrary JSON payload. Absent on the wire decodes as `null`.
    #[serde(default)]
    pub data: Value,
}

impl Event {
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self { event: event.into(), data }
    }
}

/// Encode an event as a JSON text frame.
#[must_use]
pub fn encode_event(event: &Event) -> String {
    // Serializing a struct of `String` + `Value` cannot fail; map keys are
    // always strings.
    serde_json::to_string(event).unwrap_or_default()
}

/// Decode a JSON text frame into an event.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed text, [`CodecError::EmptyName`]
/// when the name is blank and [`CodecError::Lifecycle`] when the name is
/// reserved for local lifecycle notifications.
pub fn decode_event(text: &str) -> Result<Event, CodecError> {
    let event: Event = serde_json::from_str(text)?;
    if event.event.trim().is_empty() {
        return Err(CodecError::EmptyName);
    }
    if is_lifecycle(&event.event) {
        return Err(CodecError::Lifecycle(event.event));
    }
    Ok(event)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
