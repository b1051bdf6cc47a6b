//! Application shell: owns the route and the shared client objects.
//!
//! LIFECYCLE
//! =========
//! 1. `App::new` builds the session store, API client and channel manager
//! 2. `login` pulls a token from the provider, pushes it into the API client
//!    and opens the channel, then switches to `Route::Chat`
//! 3. `logout` (or a 401 from the API) switches back to `Route::Login`

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::inspect::{inspect_token, now_secs};
use crate::auth::{AuthError, SessionStore, TokenProvider};
use crate::chat::ChatSync;
use crate::config::{ClientConfig, ConfigError};
use crate::net::{ApiClient, ApiError, ConnectionManager, Connector};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Login,
    Chat,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub struct App {
    config: ClientConfig,
    session: Arc<SessionStore>,
    api: Arc<ApiClient>,
    channel: Arc<ConnectionManager>,
    route: Arc<watch::Sender<Route>>,
}

impl App {
    /// # Errors
    ///
    /// Fails when the socket URL cannot be mapped to `ws(s)` or the HTTP
    /// client cannot be built.
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Result<Self, AppError> {
        let session = Arc::new(SessionStore::new());
        let route = Arc::new(watch::Sender::new(Route::Login));
        let api = Arc::new(ApiClient::new(&config.api_url, config.request_timeout, session.clone(), route.clone())?);
        let channel = Arc::new(ConnectionManager::new(config.ws_url()?, config.channel, connector));
        Ok(Self { config, session, api, channel, route })
    }

    #[must_use]
    pub fn route(&self) -> Route {
        *self.route.borrow()
    }

    #[must_use]
    pub fn subscribe_route(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }

    #[must_use]
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    #[must_use]
    pub fn channel(&self) -> &Arc<ConnectionManager> {
        &self.channel
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A message sync hook bound to this app's API client and channel.
    #[must_use]
    pub fn chat(&self) -> Arc<ChatSync> {
        Arc::new(ChatSync::new(
            self.api.clone(),
            self.channel.clone(),
            self.config.history_limit,
            self.config.refresh_history_on_connect,
        ))
    }

    /// Obtain a token and open the realtime channel.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; nothing is changed in that case.
    pub async fn login(&self, provider: &dyn TokenProvider) -> Result<(), AppError> {
        let token = provider.access_token().await?;
        if let Some(inspection) = inspect_token(&token, now_secs()) {
            if inspection.is_expired == Some(true) {
                tracing::warn!(expires_in = ?inspection.expires_in, "access token is already expired");
            }
        }
        self.api.set_token(Some(token.clone()));
        self.channel.connect(Some(token));
        self.route.send_replace(Route::Chat);
        tracing::info!("logged in");
        Ok(())
    }

    pub fn logout(&self) {
        self.api.set_token(None);
        self.channel.disconnect();
        self.channel.clear_all_listeners();
        self.route.send_replace(Route::Login);
        tracing::info!("logged out");
    }
}
