//! Error banner shown above the message list.

use crate::sanitize::escape_html;

/// Empty string when there is nothing to show.
#[must_use]
pub fn render_error_banner(error: Option<&str>) -> String {
    match error.map(str::trim).filter(|e| !e.is_empty()) {
        Some(error) => format!(r#"<div class="banner banner--error" role="alert">{}</div>"#, escape_html(error)),
        None => String::new(),
    }
}
