use super::*;
use crate::test_helpers::{api_client, spawn_backend};

#[test]
fn status_prefers_channel_then_backend() {
    assert_eq!(ConnectionStatus::from_parts(true, false), ConnectionStatus::Online);
    assert_eq!(ConnectionStatus::from_parts(false, true), ConnectionStatus::Degraded);
    assert_eq!(ConnectionStatus::from_parts(false, false), ConnectionStatus::Offline);
    assert_eq!(ConnectionStatus::Degraded.label(), "degraded");
}

#[tokio::test]
async fn starts_healthy_and_unchecked() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let monitor = HealthMonitor::new(api);

    let snapshot = monitor.snapshot();
    assert!(snapshot.is_healthy);
    assert!(snapshot.last_checked.is_none());
    assert!(!monitor.is_checking());
}

#[tokio::test]
async fn healthy_backend_reports_true() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let monitor = HealthMonitor::new(api);

    assert_eq!(monitor.check().await, Some(true));
    assert!(monitor.snapshot().last_checked.is_some());
    assert_eq!(monitor.status(false), ConnectionStatus::Degraded);
}

#[tokio::test]
async fn unhealthy_envelope_and_error_status_report_false() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let monitor = HealthMonitor::new(api);

    server.backend.healthy.store(false, Ordering::SeqCst);
    assert_eq!(monitor.check().await, Some(false));
    assert_eq!(monitor.status(false), ConnectionStatus::Offline);

    server.backend.healthy.store(true, Ordering::SeqCst);
    server.backend.force_status(503);
    assert_eq!(monitor.check().await, Some(false));
    assert_eq!(monitor.snapshot().error.as_deref(), Some("Forced failure"));
}

#[tokio::test]
async fn concurrent_check_is_skipped() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let monitor = HealthMonitor::new(api);

    monitor.checking.store(true, Ordering::SeqCst);
    assert_eq!(monitor.check().await, None);
    assert!(monitor.snapshot().last_checked.is_none());
}

#[tokio::test]
async fn abandoned_check_releases_in_flight_flag() {
    let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let session = Arc::new(crate::auth::SessionStore::new());
    let route = Arc::new(tokio::sync::watch::Sender::new(crate::app::Route::Chat));
    let url = format!("http://{}/api", silent.local_addr().unwrap());
    let api = ApiClient::new(&url, std::time::Duration::from_secs(5), session, route).unwrap();
    let monitor = HealthMonitor::new(Arc::new(api));

    let outcome = tokio::time::timeout(std::time::Duration::from_millis(100), monitor.check()).await;

    assert!(outcome.is_err());
    assert!(!monitor.is_checking());
    assert!(monitor.snapshot().last_checked.is_none());
}
