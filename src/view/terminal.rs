//! Single-line terminal rendering for the interactive CLI.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod terminal_test;

use crate::chat::{ChatMessage, ConnectionStatus};
use crate::sanitize::{MediaKind, Segment, decode_entities, message_segments, sanitize_text};
use crate::view::message::format_time;

/// `[HH:MM] name: body`, with media shown as bracketed links.
#[must_use]
pub fn format_message_line(message: &ChatMessage, is_own: bool) -> String {
    let name = decode_entities(&sanitize_text(&message.name));
    let author = if is_own { format!("{name} (you)") } else { name };
    format!("[{}] {author}: {}", format_time(&message.timestamp), format_body(&message.text))
}

#[must_use]
pub fn format_body(raw: &str) -> String {
    message_segments(raw)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.replace(['\n', '\r'], " "),
            Segment::Media { kind, url } => format!("[{}: {url}]", media_label(kind)),
            Segment::InvalidMedia => "[Invalid media URL]".to_owned(),
        })
        .collect()
}

#[must_use]
pub fn status_line(status: ConnectionStatus, error: Option<&str>) -> String {
    match error {
        Some(error) => format!("-- {} -- {error}", status.label()),
        None => format!("-- {} --", status.label()),
    }
}

/// The part of `current` not shown yet. When `current` no longer extends
/// what was printed (history replaced), the whole list is due again.
#[must_use]
pub fn unprinted<'a>(printed: &[ChatMessage], current: &'a [ChatMessage]) -> &'a [ChatMessage] {
    if current.starts_with(printed) { &current[printed.len()..] } else { current }
}

fn media_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image",
        MediaKind::YouTube | MediaKind::Video => "video",
    }
}
