//! Chat message model and composer validation.

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::{MAX_MESSAGE_LENGTH, MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH};
use crate::sanitize;

/// A single chat message as exchanged with the backend.
///
/// Field names on the wire are the backend's (`nombre`, `mensaje`, `color`,
/// `timestamp`). There is no server-assigned id; list position plus
/// timestamp is the only ordering key. Only `mensaje` is required when
/// decoding; a missing name or color decodes as empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "mensaje")]
    pub text: String,
    #[serde(default)]
    pub color: String,
    /// ISO-8601 timestamp.
    #[serde(default)]
    pub timestamp: String,
}

impl ChatMessage {
    /// Decode a `message:received` payload, either a JSON object or the
    /// same object JSON-encoded into a string.
    ///
    /// # Errors
    ///
    /// Anything that is not a message object, or lacks `mensaje`.
    pub fn from_payload(data: &Value) -> Result<Self, serde_json::Error> {
        match data {
            Value::String(raw) => serde_json::from_str(raw),
            other => Self::deserialize(other),
        }
    }

    /// Copy with every field passed through the text sanitizer and a
    /// timestamp filled in when absent. This is the outbound form.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            name: sanitize::sanitize_text(&self.name),
            text: sanitize::sanitize_text(&self.text),
            color: sanitize::sanitize_text(&self.color),
            timestamp: fill_timestamp(&self.timestamp),
        }
    }

    /// Copy for display of an inbound message: name and color are
    /// sanitized, the body stays raw for `sanitize::process_message` at
    /// render time.
    #[must_use]
    pub fn received(self) -> Self {
        Self {
            name: sanitize::sanitize_text(&self.name),
            text: self.text,
            color: sanitize::sanitize_text(&self.color),
            timestamp: fill_timestamp(&self.timestamp),
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username must be at least 3 characters")]
    NameTooShort,
    #[error("Username must be at most 50 characters")]
    NameTooLong,
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("Message is too long")]
    MessageTooLong,
    #[error("Invalid color format")]
    InvalidColor,
}

/// Validate a composed message before it is sent.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, checking name, then body,
/// then color.
pub fn validate(message: &ChatMessage) -> Result<(), ValidationError> {
    let name_len = message.name.chars().count();
    if name_len < MIN_USERNAME_LENGTH {
        return Err(ValidationError::NameTooShort);
    }
    if name_len > MAX_USERNAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }

    let text_len = message.text.chars().count();
    if text_len == 0 {
        return Err(ValidationError::EmptyMessage);
    }
    if text_len > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::MessageTooLong);
    }

    if !is_valid_hex_color(&message.color) {
        return Err(ValidationError::InvalidColor);
    }
    Ok(())
}

/// `#RGB` or `#RRGGBB`, case-insensitive.
#[must_use]
pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Current time as an RFC 3339 string with millisecond precision.
#[must_use]
pub fn now_iso() -> String {
    let now = OffsetDateTime::now_utc();
    let now = now.replace_nanosecond(u32::from(now.millisecond()) * 1_000_000).unwrap_or(now);
    now.format(&Rfc3339).unwrap_or_default()
}

/// Parse an ISO-8601 / RFC 3339 timestamp.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()
}

fn fill_timestamp(raw: &str) -> String {
    if raw.trim().is_empty() { now_iso() } else { raw.to_owned() }
}
