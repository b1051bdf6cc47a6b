//! HTTP client wrapper for the chat backend.
//!
//! ERROR HANDLING
//! ==============
//! Every failure surfaces as an [`ApiError`] with a human-readable message;
//! callers decide what to show. A 401 additionally clears the stored token
//! and routes the application back to the login screen before the error is
//! returned.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use super::envelope::Envelope;
use crate::app::Route;
use crate::auth::session::{AUTH_TOKEN_KEY, SessionStore};
use crate::chat::message::ChatMessage;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("session expired; please log in again")]
    Unauthorized,
    #[error("{message}")]
    Server { status: u16, code: Option<String>, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    session: Arc<SessionStore>,
    route: Arc<watch::Sender<Route>>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
        route: Arc<watch::Sender<Route>>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: RwLock::new(None),
            session,
            route,
        })
    }

    /// Replace the bearer token, mirroring it into the session store.
    pub fn set_token(&self, token: Option<String>) {
        match &token {
            Some(value) => self.session.set(AUTH_TOKEN_KEY, value),
            None => self.session.remove(AUTH_TOKEN_KEY),
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// In-memory token, falling back to the session mirror.
    pub fn auth_token(&self) -> Option<String> {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner).clone();
        token.or_else(|| self.session.get::<String>(AUTH_TOKEN_KEY))
    }

    // -------------------------------------------------------------------------
    // Typed endpoints
    // -------------------------------------------------------------------------

    /// `GET /health`. `Ok(false)` when the backend answers but reports
    /// itself unhealthy.
    ///
    /// # Errors
    ///
    /// Transport and non-2xx failures.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let envelope = self.send(Method::GET, "/health", None).await?;
        Ok(envelope.success)
    }

    /// `GET /chat/messages/history?limit=N`.
    ///
    /// # Errors
    ///
    /// Transport, non-2xx, unsuccessful envelope or malformed message list.
    pub async fn fetch_history(&self, limit: usize) -> Result<Vec<ChatMessage>, ApiError> {
        let messages: Option<Vec<ChatMessage>> = self.get(&format!("/chat/messages/history?limit={limit}")).await?;
        Ok(messages.unwrap_or_default())
    }

    /// `POST /chat/messages`.
    ///
    /// # Errors
    ///
    /// Transport, non-2xx or unsuccessful envelope.
    pub async fn post_message(&self, message: &ChatMessage) -> Result<(), ApiError> {
        let _: Value = self.post("/chat/messages", message).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Generic verbs
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope = self.send(Method::GET, path, None).await?;
        unwrap_data(envelope)
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let envelope = self.send(Method::POST, path, Some(body)).await?;
        unwrap_data(envelope)
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let envelope = self.send(Method::PUT, path, Some(body)).await?;
        unwrap_data(envelope)
    }

    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope = self.send(Method::DELETE, path, None).await?;
        unwrap_data(envelope)
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Envelope, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = self.auth_token() {
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(&json);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let envelope = serde_json::from_str::<Value>(&text)
            .map_err(|e| e.to_string())
            .and_then(|value| Envelope::from_value(value).map_err(|e| e.to_string()));

        if !status.is_success() {
            let error = envelope.ok().and_then(|env| env.error);
            let message = error.as_ref().map_or_else(
                || status.canonical_reason().unwrap_or(UNEXPECTED_ERROR).to_owned(),
                |body| body.message.clone(),
            );
            tracing::warn!(%method, path, status = status.as_u16(), %message, "api returned error status");
            return Err(ApiError::Server { status: status.as_u16(), code: error.map(|body| body.code), message });
        }

        envelope.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api response did not match envelope");
            ApiError::Decode(e)
        })
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("api returned 401; clearing session token");
        self.set_token(None);
        self.route.send_replace(Route::Login);
    }
}

fn unwrap_data<T: DeserializeOwned>(envelope: Envelope) -> Result<T, ApiError> {
    if !envelope.success {
        let (code, message) = envelope
            .error
            .map_or((None, UNEXPECTED_ERROR.to_owned()), |body| (Some(body.code), body.message));
        return Err(ApiError::Server { status: 200, code, message });
    }
    serde_json::from_value(envelope.data.unwrap_or(Value::Null)).map_err(|e| ApiError::Decode(e.to_string()))
}
