//! Navigation decisions driven by the session.
//!
//! Routes fall in three classes: public-only (sign-in and sign-up), protected
//! (everything that needs a user), and fallbacks (`/` and unknown paths) that
//! always send the user to the project list. [`RouteGuard::evaluate`] is a pure
//! function of `(Session, Route)`; [`GuardedRoute`] re-runs it whenever the
//! session changes.

use std::fmt;

use tokio::sync::watch;
use uuid::Uuid;

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    SignUp,
    Projects,
    ProjectBoard(Uuid),
    Root,
    NotFound(String),
}

impl Route {
    /// Where unauthenticated users are sent.
    pub const SIGN_IN_PATH: &'static str = "/login";
    /// Where authenticated users land.
    pub const LANDING_PATH: &'static str = "/projects";

    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        match normalized {
            "" => Route::Root,
            "/login" => Route::SignIn,
            "/signup" => Route::SignUp,
            "/projects" => Route::Projects,
            other => match other.strip_prefix("/projects/") {
                Some(id) if !id.contains('/') => match Uuid::parse_str(id) {
                    Ok(id) => Route::ProjectBoard(id),
                    Err(_) => Route::NotFound(trimmed.to_string()),
                },
                _ => Route::NotFound(trimmed.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::SignIn => Self::SIGN_IN_PATH.to_string(),
            Route::SignUp => "/signup".to_string(),
            Route::Projects => Self::LANDING_PATH.to_string(),
            Route::ProjectBoard(id) => format!("/projects/{}", id),
            Route::Root => "/".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::SignIn | Route::SignUp => Access::PublicOnly,
            Route::Projects | Route::ProjectBoard(_) => Access::Protected,
            Route::Root | Route::NotFound(_) => Access::Fallback,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Access class of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only reachable while signed out.
    PublicOnly,
    /// Only reachable while signed in.
    Protected,
    /// Always redirects to the landing page.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    pub fn of(session: &Session) -> GuardState {
        if session.loading {
            GuardState::Loading
        } else if session.user.is_some() {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session still resolving; show the waiting indicator.
    Waiting,
    Render(Route),
    Redirect(Route),
}

pub struct RouteGuard;

impl RouteGuard {
    /// Upper bound on redirect hops followed by [`RouteGuard::resolve`].
    const MAX_REDIRECTS: usize = 4;

    pub fn evaluate(session: &Session, route: &Route) -> Navigation {
        match (GuardState::of(session), route.access()) {
            (_, Access::Fallback) => Navigation::Redirect(Route::Projects),
            (GuardState::Loading, _) => Navigation::Waiting,
            (GuardState::Authenticated, Access::Protected)
            | (GuardState::Unauthenticated, Access::PublicOnly) => {
                Navigation::Render(route.clone())
            }
            (GuardState::Unauthenticated, Access::Protected) => {
                Navigation::Redirect(Route::SignIn)
            }
            (GuardState::Authenticated, Access::PublicOnly) => {
                Navigation::Redirect(Route::Projects)
            }
        }
    }

    /// Follow redirects until a route renders or the session is still loading.
    pub fn resolve(session: &Session, route: &Route) -> Navigation {
        let mut current = route.clone();
        for _ in 0..Self::MAX_REDIRECTS {
            match Self::evaluate(session, &current) {
                Navigation::Redirect(next) => current = next,
                settled => return settled,
            }
        }
        Navigation::Redirect(current)
    }
}

/// A route bound to the live session. Every session change yields a fresh
/// decision; there is no terminal state.
pub struct GuardedRoute {
    route: Route,
    session: watch::Receiver<Session>,
}

impl GuardedRoute {
    pub fn new(route: Route, session: watch::Receiver<Session>) -> Self {
        Self { route, session }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn current(&self) -> Navigation {
        RouteGuard::resolve(&self.session.borrow(), &self.route)
    }

    /// Switch to a new target and evaluate it.
    pub fn navigate(&mut self, route: Route) -> Navigation {
        self.route = route;
        self.current()
    }

    /// Wait for the next session change and re-evaluate.
    /// Returns `None` once the session store is gone.
    pub async fn changed(&mut self) -> Option<Navigation> {
        self.session.changed().await.ok()?;
        let session = self.session.borrow_and_update().clone();
        Some(RouteGuard::resolve(&session, &self.route))
    }

    /// Wait out the loading window and return the first settled decision.
    pub async fn settle(&mut self) -> Navigation {
        let mut navigation = self.current();
        while navigation == Navigation::Waiting {
            match self.changed().await {
                Some(next) => navigation = next,
                None => break,
            }
        }
        navigation
    }
}
