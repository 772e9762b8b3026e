//! Route table and navigation guard.
//!
//! The table declares which paths need an authenticated session; the
//! `RouteGuard` applies it before each navigation and rehydrates the
//! session from storage at startup.

pub mod guard;

pub use guard::RouteGuard;

/// Upper bound on chained route redirects, in case the table loops.
const MAX_REDIRECTS: usize = 8;

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub requires_auth: bool,
    pub redirect: Option<String>,
}

impl Route {
    pub fn public(path: &str, name: &str) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            requires_auth: false,
            redirect: None,
        }
    }

    pub fn protected(path: &str, name: &str) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(path, name)
        }
    }

    pub fn redirect(path: &str, to: &str) -> Self {
        Self {
            redirect: Some(to.to_string()),
            ..Self::public(path, "")
        }
    }

    /// Exact match, or `path` is nested below this route.
    fn matches(&self, path: &str) -> bool {
        if self.path == path {
            return true;
        }
        self.path != "/"
            && path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    login_path: String,
    landing_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new("/login", "/dashboard")
            .with_route(Route::public("/login", "login"))
            .with_route(Route::protected("/dashboard", "dashboard"))
            .with_route(Route::redirect("/", "/login"))
    }
}

impl RouteTable {
    /// Empty table with the login and landing destinations used by the guard.
    pub fn new(login_path: &str, landing_path: &str) -> Self {
        Self {
            routes: Vec::new(),
            login_path: normalize_path(login_path),
            landing_path: normalize_path(landing_path),
        }
    }

    pub fn with_route(mut self, mut route: Route) -> Self {
        route.path = normalize_path(&route.path);
        self.routes.push(route);
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn find(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes.iter().find(|r| r.path == path)
    }

    /// True if any route matching `path` (itself or an ancestor) requires auth.
    pub fn requires_auth(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.routes
            .iter()
            .any(|r| r.requires_auth && r.matches(&path))
    }

    pub fn is_login(&self, path: &str) -> bool {
        normalize_path(path) == self.login_path
    }

    /// Follow route-level redirects to the final destination.
    pub fn resolve(&self, path: &str) -> String {
        let mut current = normalize_path(path);
        for _ in 0..MAX_REDIRECTS {
            match self.find(&current).and_then(|r| r.redirect.as_deref()) {
                Some(next) => current = normalize_path(next),
                None => break,
            }
        }
        current
    }
}

/// Strip query and fragment, and any trailing slash except on the root.
fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
