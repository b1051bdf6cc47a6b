use super::*;
use crate::auth::StaticTokenProvider;
use crate::auth::session::AUTH_TOKEN_KEY;
use crate::net::WsConnector;
use crate::test_helpers::{MockServer, spawn_backend, wait_until};

fn app_for(server: &MockServer) -> App {
    let config = ClientConfig::default().with_overrides(Some(server.api_url()), Some(server.socket_url())).unwrap();
    App::new(config, Arc::new(WsConnector)).unwrap()
}

#[test]
fn new_app_starts_on_login() {
    let app = App::new(ClientConfig::default(), Arc::new(WsConnector)).unwrap();
    assert_eq!(app.route(), Route::Login);
    assert_eq!(app.channel().url(), "ws://localhost:5000");
}

#[tokio::test]
async fn login_without_token_stays_on_login() {
    let server = spawn_backend().await;
    let app = app_for(&server);

    let err = app.login(&StaticTokenProvider::new(None)).await.unwrap_err();

    assert!(matches!(err, AppError::Auth(AuthError::MissingToken)));
    assert_eq!(app.route(), Route::Login);
    assert!(!app.channel().is_connected());
}

#[tokio::test]
async fn login_pushes_token_and_connects() {
    let server = spawn_backend().await;
    let app = app_for(&server);

    app.login(&StaticTokenProvider::new(Some("tok".to_owned()))).await.unwrap();

    assert_eq!(app.route(), Route::Chat);
    assert_eq!(app.api().auth_token().as_deref(), Some("tok"));
    assert_eq!(app.session().get::<String>(AUTH_TOKEN_KEY).as_deref(), Some("tok"));
    wait_until(|| app.channel().is_connected()).await;
    let seen = server.backend.auth_headers.lock().unwrap().clone();
    assert_eq!(seen, vec![Some("Bearer tok".to_owned())]);
}

#[tokio::test]
async fn logout_clears_token_listeners_and_route() {
    let server = spawn_backend().await;
    let app = app_for(&server);
    app.login(&StaticTokenProvider::new(Some("tok".to_owned()))).await.unwrap();
    wait_until(|| app.channel().is_connected()).await;
    app.channel().on(events::MESSAGE_RECEIVED, |_| {});

    app.logout();

    assert_eq!(app.route(), Route::Login);
    assert!(app.api().auth_token().is_none());
    assert!(!app.channel().is_connected());
    assert_eq!(app.channel().listener_count(events::MESSAGE_RECEIVED), 0);
}

#[tokio::test]
async fn unauthorized_response_routes_to_login() {
    let server = spawn_backend().await;
    let app = app_for(&server);
    let route = app.subscribe_route();
    app.login(&StaticTokenProvider::new(Some("tok".to_owned()))).await.unwrap();
    server.backend.force_status(401);

    let chat = app.chat();
    chat.activate().await;

    wait_until(|| *route.borrow() == Route::Login).await;
    assert!(app.api().auth_token().is_none());
}
