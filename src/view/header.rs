//! Top bar: title, connection indicator, user badge and logout.

#[cfg(test)]
#[path = "header_test.rs"]
mod header_test;

use crate::chat::ConnectionStatus;
use crate::sanitize::escape_html;

pub const APP_TITLE: &str = "Una Chat";

pub struct HeaderProps<'a> {
    pub status: ConnectionStatus,
    pub user_name: Option<&'a str>,
}

#[must_use]
pub fn render_header(props: &HeaderProps<'_>) -> String {
    let label = props.status.label();
    let user = props.user_name.map_or_else(String::new, |name| {
        let initial = name.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default();
        format!(
            r#"<span class="header__user"><span class="header__avatar">{}</span><span class="header__name">{}</span></span><button class="header__logout" type="button">Logout</button>"#,
            escape_html(&initial),
            escape_html(name),
        )
    });
    format!(
        r#"<header class="header"><h1 class="header__title">{APP_TITLE}</h1><span class="header__status"><span class="header__dot header__dot--{label}"></span>{label}</span>{user}</header>"#
    )
}
