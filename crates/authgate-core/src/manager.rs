//! Session manager: the owned service that login and logout go through.
//!
//! One instance owns the `SessionState`, shares the `TokenStore` with the
//! transport's bearer interceptor, and holds the `AuthGateway`. The route
//! guard borrows it for each evaluation.

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, AuthGateway};
use crate::auth::{Session, SessionState, TokenStore};
use crate::config::Config;
use crate::error::{ErrorNormalizer, ErrorRecord};
use crate::models::{Credentials, User};

pub struct SessionManager {
    state: SessionState,
    tokens: TokenStore,
    gateway: AuthGateway,
    loading: watch::Sender<bool>,
    last_error: Option<ErrorRecord>,
}

impl SessionManager {
    /// Build around a transport; its token store becomes the manager's.
    pub fn new(client: ApiClient) -> Self {
        let tokens = client.tokens().clone();
        let (loading, _) = watch::channel(false);
        Self {
            state: SessionState::new(),
            tokens,
            gateway: AuthGateway::new(client),
            loading,
            last_error: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let tokens = config.token_store()?;
        let client = ApiClient::from_config(config, tokens)?;
        Ok(Self::new(client))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session()
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Error from the most recent login attempt, cleared when a new one starts.
    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Receiver that flips to `true` while a login or verify call is in flight.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.loading.send_replace(loading);
    }

    pub(crate) fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Log in, persist the token per the remember-me choice, and enter the
    /// authenticated state.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<Session, ErrorRecord> {
        self.last_error = None;
        let result = self.try_login(credentials).await;
        if let Err(ref record) = result {
            self.last_error = Some(record.clone());
        }
        result
    }

    async fn try_login(&mut self, credentials: &Credentials) -> Result<Session, ErrorRecord> {
        credentials.validate()?;

        self.set_loading(true);
        let result = self.gateway.login(credentials).await;
        self.set_loading(false);
        let data = result?;

        if let Err(e) = self.tokens.save(&data.token, credentials.remember_me) {
            warn!(error = %e, "Failed to persist token");
            self.tokens.clear();
            return Err(ErrorNormalizer::normalize(&e));
        }

        self.state.set_auth(data.user, data.token);
        info!(remember_me = credentials.remember_me, "Session started");
        self.state.session().cloned().ok_or_else(ErrorRecord::unknown)
    }

    /// End the session. Local state is cleared first, whatever happens to
    /// the server notification that follows in the background. Returns
    /// `None` when no runtime is available to send it.
    pub fn logout(&mut self) -> Option<JoinHandle<()>> {
        let request = self.gateway.logout_request();
        self.discard_session();
        self.last_error = None;
        info!("Logged out");
        AuthGateway::dispatch_logout(request)
    }

    /// Drop local session state and stored tokens without contacting the server.
    pub fn discard_session(&mut self) {
        self.state.clear_auth();
        self.tokens.clear();
        debug!("Local session discarded");
    }
}
