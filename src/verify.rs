//! End-to-end integration check: API health plus a socket handshake.

#[cfg(test)]
#[path = "verify_test.rs"]
mod verify_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::auth::inspect::{inspect_token, now_secs};
use crate::net::{ApiClient, ConnectionManager};

const FAILURE_MARKERS: [&str; 3] = ["failed", "error", "timeout"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub ok: bool,
    pub findings: Vec<String>,
}

impl CheckReport {
    fn from_findings(findings: Vec<String>) -> Self {
        let ok = findings.iter().all(|finding| {
            let lower = finding.to_lowercase();
            !FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
        });
        Self { ok, findings }
    }
}

/// Check the API and the realtime channel, each bounded by `timeout`.
///
/// The channel is disconnected afterwards; listeners registered by the
/// check are removed.
pub async fn verify_integration(
    api: &ApiClient,
    channel: &Arc<ConnectionManager>,
    token: Option<&str>,
    timeout: Duration,
) -> CheckReport {
    let mut findings = Vec::new();
    let timeout_ms = timeout.as_millis();

    match token {
        Some(token) => {
            api.set_token(Some(token.to_owned()));
            findings.push(describe_token(token));
        }
        None => findings.push("No token provided; checks run unauthenticated".to_owned()),
    }

    findings.push(match tokio::time::timeout(timeout, api.health()).await {
        Ok(Ok(true)) => "API health check passed".to_owned(),
        Ok(Ok(false)) => "API health check failed: backend reported unhealthy".to_owned(),
        Ok(Err(e)) => format!("API health check failed: {e}"),
        Err(_) => format!("API health check timeout after {timeout_ms} ms"),
    });

    findings.push(check_socket(channel, token, timeout).await);

    let report = CheckReport::from_findings(findings);
    tracing::info!(ok = report.ok, findings = report.findings.len(), "integration check finished");
    report
}

async fn check_socket(channel: &Arc<ConnectionManager>, token: Option<&str>, timeout: Duration) -> String {
    if channel.is_connected() {
        return format!("Socket already connected to {}", channel.url());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Result<(), String>>();
    let on_connect = {
        let tx = tx.clone();
        channel.on(events::CONNECT, move |_| {
            let _ = tx.send(Ok(()));
        })
    };
    let on_error = channel.on(events::CONNECT_ERROR, move |data| {
        let reason = data.as_str().unwrap_or("unknown").to_owned();
        let _ = tx.send(Err(reason));
    });

    channel.connect(token.map(str::to_owned));
    let outcome = tokio::time::timeout(timeout, rx.recv()).await;

    channel.off(events::CONNECT, on_connect);
    channel.off(events::CONNECT_ERROR, on_error);
    channel.disconnect();

    match outcome {
        Ok(Some(Ok(()))) => format!("Socket connected to {}", channel.url()),
        Ok(Some(Err(reason))) => format!("Socket connect error: {reason}"),
        Ok(None) => "Socket connect failed: listener dropped".to_owned(),
        Err(_) => format!("Socket connect timeout after {} ms", timeout.as_millis()),
    }
}

fn describe_token(token: &str) -> String {
    match inspect_token(token, now_secs()) {
        Some(inspection) => match (inspection.is_expired, inspection.expires_in) {
            (Some(true), _) => "Token check failed: token is expired".to_owned(),
            (_, Some(secs)) => format!("Token present; expires in {secs} s"),
            _ => "Token present; no expiry claim".to_owned(),
        },
        None => "Token present (opaque; expiry unknown)".to_owned(),
    }
}
