use super::*;
use crate::config::ChannelConfig;
use crate::net::WsConnector;
use crate::test_helpers::{api_client, channel, spawn_backend};

fn dead_channel(url: String) -> Arc<ConnectionManager> {
    let config = ChannelConfig { reconnect_delay: Duration::from_millis(20), max_reconnect_attempts: 5 };
    Arc::new(ConnectionManager::new(url, config, Arc::new(WsConnector)))
}

#[test]
fn report_is_ok_only_without_failure_markers() {
    assert!(CheckReport::from_findings(vec!["API health check passed".to_owned()]).ok);
    assert!(!CheckReport::from_findings(vec!["Socket connect ERROR: refused".to_owned()]).ok);
    assert!(!CheckReport::from_findings(vec!["x".to_owned(), "Timeout".to_owned()]).ok);
}

#[tokio::test]
async fn healthy_backend_and_socket_pass() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let channel = channel(&server);

    let report = verify_integration(&api, &channel, Some("opaque-token"), Duration::from_secs(2)).await;

    assert!(report.ok, "findings: {:?}", report.findings);
    assert_eq!(report.findings.len(), 3);
    assert!(!channel.is_connected());
    assert_eq!(channel.listener_count(events::CONNECT), 0);
    let seen = server.backend.auth_headers.lock().unwrap().clone();
    assert!(seen.iter().all(|h| h.as_deref() == Some("Bearer opaque-token")));
}

#[tokio::test]
async fn failing_health_is_reported() {
    let server = spawn_backend().await;
    server.backend.force_status(500);
    let (api, _, _) = api_client(&server);
    let channel = channel(&server);

    let report = verify_integration(&api, &channel, None, Duration::from_secs(2)).await;

    assert!(!report.ok);
    assert!(report.findings.iter().any(|f| f.starts_with("API health check failed")));
}

#[tokio::test]
async fn refused_socket_is_reported_as_connect_error() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = unused.local_addr().unwrap();
    drop(unused);
    let channel = dead_channel(format!("ws://{addr}/ws"));

    let report = verify_integration(&api, &channel, None, Duration::from_secs(2)).await;

    assert!(!report.ok);
    assert!(report.findings.iter().any(|f| f.starts_with("Socket connect error")), "{:?}", report.findings);
}

#[tokio::test]
async fn silent_socket_times_out() {
    let server = spawn_backend().await;
    let (api, _, _) = api_client(&server);
    let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let channel = dead_channel(format!("ws://{}/ws", silent.local_addr().unwrap()));

    let report = verify_integration(&api, &channel, None, Duration::from_millis(200)).await;

    assert!(!report.ok);
    assert!(report.findings.iter().any(|f| f.starts_with("Socket connect timeout")), "{:?}", report.findings);
}
