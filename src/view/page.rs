//! Whole-page composition: chat screen and standalone HTML document.

use super::banner::render_error_banner;
use super::composer::Composer;
use super::header::{APP_TITLE, HeaderProps, render_header};
use super::message_list::render_message_list;
use crate::chat::{ChatState, ConnectionStatus};

pub struct ChatPageProps<'a> {
    pub state: &'a ChatState,
    pub status: ConnectionStatus,
    pub current_user: Option<&'a str>,
    pub composer: &'a Composer,
}

/// Header, error banner, message list and composer. The composer is
/// disabled unless the realtime channel is online.
#[must_use]
pub fn render_chat_page(props: &ChatPageProps<'_>) -> String {
    let header = render_header(&HeaderProps { status: props.status, user_name: props.current_user });
    let banner = render_error_banner(props.state.error.as_deref());
    let list = render_message_list(props.state, props.current_user);
    let composer = props.composer.render(props.status != ConnectionStatus::Online);
    format!(r#"<div class="chat">{header}{banner}{list}{composer}</div>"#)
}

/// Wrap a fragment in a minimal HTML document.
#[must_use]
pub fn render_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{APP_TITLE}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}
