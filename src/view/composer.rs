//! Message composer state and rendering.

#[cfg(test)]
#[path = "composer_test.rs"]
mod composer_test;

use crate::config::MAX_MESSAGE_LENGTH;
use crate::sanitize::escape_html;

/// Remaining-character count below which the hint is shown.
pub const NEAR_LIMIT: usize = 100;
/// Remaining-character count below which the hint turns critical.
pub const CRITICAL_LIMIT: usize = 50;

pub const DEFAULT_PLACEHOLDER: &str = "Type a message...";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composer {
    text: String,
}

impl Composer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the draft. Input beyond the length limit is refused and the
    /// previous draft kept.
    pub fn set_text(&mut self, text: &str) -> bool {
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return false;
        }
        text.clone_into(&mut self.text);
        true
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        MAX_MESSAGE_LENGTH.saturating_sub(self.text.chars().count())
    }

    #[must_use]
    pub fn can_submit(&self, disabled: bool) -> bool {
        !disabled && !self.text.trim().is_empty()
    }

    /// Take the trimmed draft, clearing the composer. `None` when disabled
    /// or blank; the draft is kept in that case.
    pub fn submit(&mut self, disabled: bool) -> Option<String> {
        if !self.can_submit(disabled) {
            return None;
        }
        let text = self.text.trim().to_owned();
        self.text.clear();
        Some(text)
    }

    /// `"N characters remaining"` once fewer than [`NEAR_LIMIT`] remain.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        let remaining = self.remaining();
        (remaining < NEAR_LIMIT).then(|| format!("{remaining} characters remaining"))
    }

    #[must_use]
    pub fn render(&self, disabled: bool) -> String {
        let disabled_attr = if disabled { " disabled" } else { "" };
        let button_attr = if self.can_submit(disabled) { "" } else { " disabled" };
        let hint = self.hint().map_or_else(String::new, |hint| {
            let level = if self.remaining() < CRITICAL_LIMIT { "critical" } else { "warning" };
            format!(r#"<span class="composer__hint composer__hint--{level}">{hint}</span>"#)
        });
        format!(
            r#"<form class="composer"><textarea class="composer__input" rows="1" placeholder="{DEFAULT_PLACEHOLDER}"{disabled_attr}>{}</textarea><button class="composer__send" type="submit"{button_attr}>Send</button>{hint}</form>"#,
            escape_html(&self.text)
        )
    }
}
