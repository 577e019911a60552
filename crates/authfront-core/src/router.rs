//! Client-side routing between the two pages.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

/// A page reachable by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Protected,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no route for path {0:?}")]
pub struct UnknownRoute(pub String);

impl Route {
    pub const ALL: [Route; 2] = [Route::Login, Route::Protected];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Protected => "/protected",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Protected => "Protected",
        }
    }

    /// Exact match on the literal path; there is no fallback route.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s).ok_or_else(|| UnknownRoute(s.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Anything pages can ask to show another route.
pub trait Navigator {
    fn navigate(&mut self, route: Route);
}

/// Holds the current route and remembers that it changed until the
/// change is taken.
#[derive(Debug)]
pub struct Router {
    current: Route,
    changed: bool,
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            changed: true,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Returns the route if it changed since the last call.
    pub fn take_change(&mut self) -> Option<Route> {
        std::mem::take(&mut self.changed).then_some(self.current)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

impl Navigator for Router {
    fn navigate(&mut self, route: Route) {
        debug!(from = %self.current, to = %route, "Navigating");
        self.current = route;
        self.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::from_path("/"), Some(Route::Login));
        assert_eq!(Route::from_path("/protected"), Some(Route::Protected));
        assert_eq!(Route::Protected.to_string(), "/protected");
    }

    #[test]
    fn test_unknown_paths_have_no_route() {
        assert_eq!(Route::from_path(""), None);
        assert_eq!(Route::from_path("/protected/"), None);
        assert_eq!(Route::from_path("/Protected"), None);
        assert_eq!(
            "/admin".parse::<Route>(),
            Err(UnknownRoute("/admin".to_string()))
        );
    }

    #[test]
    fn test_router_reports_changes_once() {
        let mut router = Router::default();
        assert_eq!(router.take_change(), Some(Route::Login));
        assert_eq!(router.take_change(), None);

        router.navigate(Route::Protected);
        assert_eq!(router.current(), Route::Protected);
        assert_eq!(router.take_change(), Some(Route::Protected));
        assert_eq!(router.take_change(), None);
    }
}
