//! Author color palette and the per-session color preference.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use rand::Rng;

use super::message::is_valid_hex_color;
use crate::auth::session::{CHAT_COLOR_KEY, SessionStore};

pub const DEFAULT_COLORS: [&str; 10] = [
    "#FF5733", "#3498DB", "#2ECC71", "#9B59B6", "#F39C12", "#E74C3C", "#1ABC9C", "#34495E", "#E67E22", "#95A5A6",
];

#[must_use]
pub fn random_color() -> &'static str {
    DEFAULT_COLORS[rand::rng().random_range(0..DEFAULT_COLORS.len())]
}

/// The session's color: the stored preference when valid, otherwise a
/// random palette color that is stored for next time.
#[must_use]
pub fn preferred_color(session: &SessionStore) -> String {
    if let Some(color) = session.get::<String>(CHAT_COLOR_KEY).filter(|c| is_valid_hex_color(c)) {
        return color;
    }
    let color = random_color().to_owned();
    session.set(CHAT_COLOR_KEY, &color);
    color
}

/// Store an explicit choice. Invalid colors are ignored.
pub fn set_preferred_color(session: &SessionStore, color: &str) -> bool {
    if !is_valid_hex_color(color) {
        tracing::warn!(color, "ignoring invalid color preference");
        return false;
    }
    session.set(CHAT_COLOR_KEY, &color);
    true
}
