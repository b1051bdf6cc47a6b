//! Backend health tracking for the header connection indicator.

#[cfg(test)]
#[path = "health_test.rs"]
mod health_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;

use crate::net::ApiClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    Degraded,
    Offline,
}

impl ConnectionStatus {
    /// Realtime channel first, backend health second.
    #[must_use]
    pub fn from_parts(channel_connected: bool, backend_healthy: bool) -> Self {
        match (channel_connected, backend_healthy) {
            (true, _) => Self::Online,
            (false, true) => Self::Degraded,
            (false, false) => Self::Offline,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Degraded => "degraded",
            Self::Offline => "offline",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub is_healthy: bool,
    pub last_checked: Option<OffsetDateTime>,
    pub error: Option<String>,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self { is_healthy: true, last_checked: None, error: None }
    }
}

pub struct HealthMonitor {
    api: Arc<ApiClient>,
    checking: AtomicBool,
    snapshot: Mutex<HealthSnapshot>,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, checking: AtomicBool::new(false), snapshot: Mutex::new(HealthSnapshot::default()) }
    }

    /// Run one health check. Returns `None` without calling the backend when
    /// a check is already in flight.
    pub async fn check(&self) -> Option<bool> {
        if self.checking.swap(true, Ordering::SeqCst) {
            tracing::debug!("health check already in progress");
            return None;
        }
        let _checking = CheckingGuard(&self.checking);

        let (healthy, error) = match self.api.health().await {
            Ok(true) => (true, None),
            Ok(false) => (false, Some("backend reported unhealthy".to_owned())),
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                (false, Some(e.to_string()))
            }
        };

        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) =
            HealthSnapshot { is_healthy: healthy, last_checked: Some(OffsetDateTime::now_utc()), error };
        Some(healthy)
    }

    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.checking.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn status(&self, channel_connected: bool) -> ConnectionStatus {
        ConnectionStatus::from_parts(channel_connected, self.snapshot().is_healthy)
    }
}

/// Clears the in-flight flag even when the check future is dropped.
struct CheckingGuard<'a>(&'a AtomicBool);

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
