//! Login and loading screens.

use crate::sanitize::escape_html;
use crate::view::header::APP_TITLE;

/// Login screen. Without an authorize URL (identity provider not
/// configured) the button is rendered disabled.
#[must_use]
pub fn render_login(authorize_url: Option<&str>) -> String {
    let action = match authorize_url {
        Some(url) => format!(r#"<a class="login__button" href="{}">Log in</a>"#, escape_html(url)),
        None => r#"<button class="login__button" type="button" disabled>Log in</button>"#.to_owned(),
    };
    format!(
        r#"<main class="login"><h1 class="login__title">{APP_TITLE}</h1><p class="login__subtitle">Sign in to join the conversation</p>{action}</main>"#
    )
}

#[must_use]
pub fn render_loading(message: &str) -> String {
    format!(
        r#"<div class="loading"><span class="loading__spinner"></span><p class="loading__text">{}</p></div>"#,
        escape_html(message)
    )
}
