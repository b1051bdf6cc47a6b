//! A single chat message.

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use crate::chat::ChatMessage;
use crate::chat::message::{is_valid_hex_color, parse_timestamp};
use crate::sanitize::{escape_html, process_message, sanitize_text};

/// `HH:MM` in the timestamp's own offset; the raw string when unparseable.
#[must_use]
pub fn format_time(timestamp: &str) -> String {
    parse_timestamp(timestamp).map_or_else(
        || timestamp.to_owned(),
        |ts| format!("{:02}:{:02}", ts.hour(), ts.minute()),
    )
}

#[must_use]
pub fn render_message(message: &ChatMessage, is_own: bool) -> String {
    let modifier = if is_own { "own" } else { "other" };
    let author_style = if !is_own && is_valid_hex_color(&message.color) {
        format!(r#" style="color: {}""#, message.color)
    } else {
        String::new()
    };
    format!(
        r#"<div class="chat-message chat-message--{modifier}"><div class="chat-message__meta"><span class="chat-message__author"{author_style}>{}</span><span class="chat-message__time">{}</span></div><div class="chat-message__body">{}</div></div>"#,
        sanitize_text(&message.name),
        escape_html(&format_time(&message.timestamp)),
        process_message(&message.text),
    )
}
