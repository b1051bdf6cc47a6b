//! Client configuration parsed from environment variables.
//!
//! Every value is externally supplied; nothing here is computed from the
//! running environment beyond the `http(s)` to `ws(s)` mapping of the socket
//! endpoint.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SOCKET_URL: &str = "http://localhost:5000";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/callback";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

pub const MAX_MESSAGE_LENGTH: usize = 5_000;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Per-sender message budget the backend enforces. Not checked client-side.
pub const MESSAGE_RATE_LIMIT: RateLimit = RateLimit { window: Duration::from_millis(60_000), max_messages: 30 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub window: Duration,
    pub max_messages: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL in {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("unsupported scheme in {var}: {value} (expected http, https, ws or wss)")]
    UnsupportedScheme { var: &'static str, value: String },
}

/// Identity provider settings for the redirect login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityConfig {
    pub domain: String,
    pub client_id: String,
    pub audience: String,
    pub redirect_uri: String,
}

/// Reconnect policy for the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub socket_url: String,
    pub identity: IdentityConfig,
    pub request_timeout: Duration,
    pub channel: ChannelConfig,
    pub history_limit: usize,
    pub refresh_history_on_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            socket_url: DEFAULT_SOCKET_URL.to_owned(),
            identity: IdentityConfig {
                redirect_uri: DEFAULT_REDIRECT_URI.to_owned(),
                ..IdentityConfig::default()
            },
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            channel: ChannelConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            refresh_history_on_connect: false,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional (defaults in parentheses):
    /// - `UNA_CHAT_API_URL` (`http://localhost:5000/api`)
    /// - `UNA_CHAT_SOCKET_URL` (`http://localhost:5000`)
    /// - `UNA_CHAT_AUTH_DOMAIN`, `UNA_CHAT_AUTH_CLIENT_ID`, `UNA_CHAT_AUTH_AUDIENCE`
    /// - `UNA_CHAT_AUTH_REDIRECT_URI` (`http://localhost:5173/callback`)
    /// - `UNA_CHAT_REQUEST_TIMEOUT_MS` (10000)
    /// - `UNA_CHAT_RECONNECT_DELAY_MS` (3000)
    /// - `UNA_CHAT_MAX_RECONNECT_ATTEMPTS` (5)
    /// - `UNA_CHAT_HISTORY_LIMIT` (20)
    /// - `UNA_CHAT_REFRESH_HISTORY_ON_CONNECT` (false)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when either endpoint URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("UNA_CHAT_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        validate_url("UNA_CHAT_API_URL", &api_url)?;

        let socket_url = std::env::var("UNA_CHAT_SOCKET_URL").unwrap_or_else(|_| DEFAULT_SOCKET_URL.to_owned());
        validate_url("UNA_CHAT_SOCKET_URL", &socket_url)?;

        let identity = IdentityConfig {
            domain: std::env::var("UNA_CHAT_AUTH_DOMAIN").unwrap_or_default(),
            client_id: std::env::var("UNA_CHAT_AUTH_CLIENT_ID").unwrap_or_default(),
            audience: std::env::var("UNA_CHAT_AUTH_AUDIENCE").unwrap_or_default(),
            redirect_uri: std::env::var("UNA_CHAT_AUTH_REDIRECT_URI")
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_owned()),
        };

        let channel = ChannelConfig {
            reconnect_delay: Duration::from_millis(env_parse(
                "UNA_CHAT_RECONNECT_DELAY_MS",
                DEFAULT_RECONNECT_DELAY_MS,
            )),
            max_reconnect_attempts: env_parse("UNA_CHAT_MAX_RECONNECT_ATTEMPTS", DEFAULT_MAX_RECONNECT_ATTEMPTS),
        };

        Ok(Self {
            api_url,
            socket_url,
            identity,
            request_timeout: Duration::from_millis(env_parse(
                "UNA_CHAT_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            channel,
            history_limit: env_parse("UNA_CHAT_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT),
            refresh_history_on_connect: env_parse("UNA_CHAT_REFRESH_HISTORY_ON_CONNECT", false),
        })
    }

    /// Apply command-line endpoint overrides on top of the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override does not parse.
    pub fn with_overrides(mut self, api_url: Option<String>, socket_url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = api_url {
            validate_url("--api-url", &url)?;
            self.api_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(url) = socket_url {
            validate_url("--socket-url", &url)?;
            self.socket_url = url;
        }
        Ok(self)
    }

    /// WebSocket URL for the realtime channel.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedScheme`] for anything other than
    /// `http`, `https`, `ws` or `wss`.
    pub fn ws_url(&self) -> Result<String, ConfigError> {
        ws_url(&self.socket_url)
    }
}

/// Map an `http(s)` endpoint onto the matching `ws(s)` scheme.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedScheme`] for any other scheme.
pub fn ws_url(base_url: &str) -> Result<String, ConfigError> {
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}"));
    }
    if base_url.starts_with("ws://") || base_url.starts_with("wss://") {
        return Ok(base_url.to_owned());
    }

    Err(ConfigError::UnsupportedScheme { var: "UNA_CHAT_SOCKET_URL", value: base_url.to_owned() })
}

fn validate_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|_| ConfigError::InvalidUrl { var, value: value.to_owned() })?;
    match parsed.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(()),
        _ => Err(ConfigError::UnsupportedScheme { var, value: value.to_owned() }),
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
