//! The scrollable message list with its loading and empty states.

#[cfg(test)]
#[path = "message_list_test.rs"]
mod message_list_test;

use super::login::render_loading;
use super::message::render_message;
use crate::chat::ChatState;

#[must_use]
pub fn render_message_list(state: &ChatState, current_user: Option<&str>) -> String {
    if state.loading && state.messages.is_empty() {
        return render_loading("Loading messages...");
    }
    if state.messages.is_empty() {
        return r#"<div class="message-list message-list--empty"><p class="message-list__title">No messages yet</p><p class="message-list__hint">Be the first to send a message!</p></div>"#.to_owned();
    }

    let items: String = state
        .messages
        .iter()
        .map(|message| render_message(message, current_user == Some(message.name.as_str())))
        .collect();
    format!(r#"<div class="message-list">{items}</div>"#)
}
