use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Token, User};
use crate::utils::now_millis;

/// Everything that exists only while authenticated. The fields always
/// change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub token: Token,
    /// Epoch milliseconds when `set_auth` ran
    pub login_time: i64,
}

impl Session {
    pub fn expires_at(&self) -> i64 {
        self.login_time.saturating_add(self.token.lifetime_ms())
    }

    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at()
    }

    pub fn time_until_expiry(&self) -> Duration {
        // Duration cannot hold i64::MIN milliseconds
        let ms = self.expires_at().saturating_sub(now_millis()).max(-i64::MAX);
        Duration::milliseconds(ms)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

/// In-memory authentication state.
///
/// Only `set_auth` and `clear_auth` change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the authenticated state, replacing any previous session.
    pub fn set_auth(&mut self, user: User, token: Token) {
        self.set_auth_at(user, token, now_millis());
    }

    pub(crate) fn set_auth_at(&mut self, user: User, token: Token, login_time: i64) {
        debug!(user = %user.username, expires_in = token.expires_in, "Session authenticated");
        *self = SessionState::Authenticated(Session {
            user,
            token,
            login_time,
        });
    }

    /// Return to the unauthenticated baseline.
    pub fn clear_auth(&mut self) {
        if self.is_authenticated() {
            debug!("Session cleared");
        }
        *self = SessionState::Unauthenticated;
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&Token> {
        self.session().map(|s| &s.token)
    }

    pub fn login_time(&self) -> Option<i64> {
        self.session().map(|s| s.login_time)
    }

    /// False when unauthenticated, else whether the token lifetime has not
    /// yet elapsed since login.
    pub fn is_token_valid(&self) -> bool {
        self.is_token_valid_at(now_millis())
    }

    pub fn is_token_valid_at(&self, now_ms: i64) -> bool {
        self.session().map(|s| s.is_valid_at(now_ms)).unwrap_or(false)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.session().map(Session::expires_at)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(self)
    }
}

/// Flat four-field view of the state, for display and serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub token: Option<Token>,
    pub login_time: Option<i64>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Authenticated(s) => Self {
                is_authenticated: true,
                user: Some(s.user.clone()),
                token: Some(s.token.clone()),
                login_time: Some(s.login_time),
            },
            SessionState::Unauthenticated => Self {
                is_authenticated: false,
                user: None,
                token: None,
                login_time: None,
            },
        }
    }
}
