use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::error::ErrorRecord;
use crate::manager::SessionManager;
use crate::models::Token;

use super::{Navigation, RouteTable};

/// Navigation interceptor. Holds the route table and whether startup
/// rehydration has run; session state lives in the `SessionManager`.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    routes: RouteTable,
    rehydrated: bool,
}

impl RouteGuard {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            rehydrated: false,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn has_rehydrated(&self) -> bool {
        self.rehydrated
    }

    /// Rebuild the session from a stored token.
    ///
    /// `Ok(None)`: nothing usable was stored. `Ok(Some)`: the server
    /// confirmed the token. `Err`: verification failed and the local
    /// session was discarded.
    pub async fn check_auth(
        &mut self,
        manager: &mut SessionManager,
    ) -> Result<Option<Session>, ErrorRecord> {
        self.rehydrated = true;

        let Some(stored) = manager.tokens().get() else {
            manager.state_mut().clear_auth();
            debug!("No stored token, starting unauthenticated");
            return Ok(None);
        };

        if manager.tokens().is_expired() {
            info!("Stored token expired, clearing");
            manager.discard_session();
            return Ok(None);
        }

        manager.set_loading(true);
        let result = manager.gateway().verify().await;
        manager.set_loading(false);

        match result {
            Ok(data) => {
                let remaining = manager.tokens().remaining_secs();
                manager
                    .state_mut()
                    .set_auth(data.user, Token::rehydrated(stored, remaining));
                info!(remaining_secs = remaining, "Session rehydrated");
                Ok(manager.session().cloned())
            }
            Err(record) => {
                // Any failure, transient or not, ends the session
                warn!(kind = %record.kind, "Rehydration failed, logging out");
                manager.discard_session();
                Err(record)
            }
        }
    }

    /// Apply the navigation policy for a move to `to`.
    pub fn before_each(&self, manager: &mut SessionManager, to: &str) -> Navigation {
        if manager.is_authenticated() && manager.tokens().is_expired() {
            info!("Token expired during navigation, clearing session");
            manager.discard_session();
        }

        let target = self.routes.resolve(to);
        let authenticated = manager.is_authenticated();

        let decision = if self.routes.requires_auth(&target) && !authenticated {
            Navigation::Redirect(self.routes.login_path().to_string())
        } else if self.routes.is_login(&target) && authenticated {
            Navigation::Redirect(self.routes.landing_path().to_string())
        } else if target != super::normalize_path(to) {
            Navigation::Redirect(target)
        } else {
            Navigation::Allow
        };

        debug!(to, ?decision, authenticated, "Navigation evaluated");
        decision
    }

    /// Evaluate a navigation, running startup rehydration first if it has
    /// not run yet.
    pub async fn navigate(&mut self, manager: &mut SessionManager, to: &str) -> Navigation {
        if !self.rehydrated {
            // Failure already left the session cleared; the guard decides from there
            let _ = self.check_auth(manager).await;
        }
        self.before_each(manager, to)
    }
}
