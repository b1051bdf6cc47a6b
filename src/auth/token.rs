//! Bearer token sources.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use url::Url;

use super::AuthError;
use crate::config::IdentityConfig;

/// Supplies the bearer credential used by the HTTP client and the channel.
///
/// Implementations wrap an identity provider SDK (silent refresh, device
/// flow, etc.). The rest of the crate only ever sees the opaque string.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// A provider backed by a token obtained out of band (flag or env var).
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let token = token.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());
        Self { token }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.token.clone().ok_or(AuthError::MissingToken)
    }
}

/// Build the identity provider's `/authorize` URL for the redirect login flow.
///
/// # Errors
///
/// Returns [`AuthError::NotConfigured`] when the domain or client id is empty.
pub fn authorize_url(identity: &IdentityConfig, state: &str) -> Result<String, AuthError> {
    if identity.domain.trim().is_empty() {
        return Err(AuthError::NotConfigured("UNA_CHAT_AUTH_DOMAIN"));
    }
    if identity.client_id.trim().is_empty() {
        return Err(AuthError::NotConfigured("UNA_CHAT_AUTH_CLIENT_ID"));
    }

    let domain = identity.domain.trim().trim_end_matches('/');
    let base = if domain.starts_with("http://") || domain.starts_with("https://") {
        format!("{domain}/authorize")
    } else {
        format!("https://{domain}/authorize")
    };

    let mut url = Url::parse(&base).map_err(|e| AuthError::Provider(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", &identity.client_id)
            .append_pair("redirect_uri", &identity.redirect_uri)
            .append_pair("scope", "openid profile email");
        if !identity.audience.is_empty() {
            query.append_pair("audience", &identity.audience);
        }
        query.append_pair("state", state);
    }
    Ok(url.into())
}
