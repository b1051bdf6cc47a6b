use super::*;

#[test]
fn header_shows_status_dot_and_label() {
    let html = render_header(&HeaderProps { status: ConnectionStatus::Degraded, user_name: None });
    assert!(html.contains(r#"<span class="header__dot header__dot--degraded"></span>degraded"#));
    assert!(!html.contains("header__logout"));
}

#[test]
fn header_shows_user_initial_and_logout() {
    let html = render_header(&HeaderProps { status: ConnectionStatus::Online, user_name: Some("ana") });
    assert!(html.contains(r#"<span class="header__avatar">A</span>"#));
    assert!(html.contains("header__logout"));
}

#[test]
fn user_name_is_escaped() {
    let html = render_header(&HeaderProps { status: ConnectionStatus::Offline, user_name: Some("<b>x</b>") });
    assert!(!html.contains("<b>"));
}
