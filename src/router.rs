//! Route table, navigation guard, and navigation history.
//!
//! DESIGN
//! ======
//! [`guard`] is a pure function of route metadata and a session snapshot.
//! [`Router`] resolves a path, asks the guard, records the return path when
//! the guard bounces an unauthenticated visitor, and pushes the resulting
//! location onto the injected [`History`]. Nothing here touches the network.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::state::session::{Session, SessionContext};

// =============================================================================
// ROUTES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteName {
    MyBookings,
    Login,
    Register,
    BookRoom,
    Profile,
    AdminManageRooms,
    AdminCreateRoom,
    AdminEditRoom,
    AdminManageUsers,
    AdminEditUser,
    AdminBookings,
    NotFound,
}

/// Access flags attached to a route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Implies `requires_auth`.
    pub requires_admin: bool,
    /// Only reachable while logged out (login, register).
    pub guest_only: bool,
}

impl RouteMeta {
    pub const PUBLIC: Self = Self { requires_auth: false, requires_admin: false, guest_only: false };
    pub const AUTH: Self = Self { requires_auth: true, requires_admin: false, guest_only: false };
    pub const ADMIN: Self = Self { requires_auth: true, requires_admin: true, guest_only: false };
    pub const GUEST: Self = Self { requires_auth: false, requires_admin: false, guest_only: true };
}

#[derive(Clone, Copy, Debug)]
pub struct RouteDef {
    pub name: RouteName,
    /// Path pattern; `:param` segments match any non-empty segment.
    pub pattern: &'static str,
    pub meta: RouteMeta,
}

pub const ROUTES: &[RouteDef] = &[
    RouteDef { name: RouteName::MyBookings, pattern: "/", meta: RouteMeta::AUTH },
    RouteDef { name: RouteName::Login, pattern: "/login", meta: RouteMeta::GUEST },
    RouteDef { name: RouteName::Register, pattern: "/register", meta: RouteMeta::GUEST },
    RouteDef { name: RouteName::BookRoom, pattern: "/book", meta: RouteMeta::AUTH },
    RouteDef { name: RouteName::Profile, pattern: "/profile", meta: RouteMeta::AUTH },
    RouteDef { name: RouteName::AdminManageRooms, pattern: "/admin/rooms", meta: RouteMeta::ADMIN },
    RouteDef { name: RouteName::AdminCreateRoom, pattern: "/admin/rooms/new", meta: RouteMeta::ADMIN },
    RouteDef { name: RouteName::AdminEditRoom, pattern: "/admin/rooms/:id/edit", meta: RouteMeta::ADMIN },
    RouteDef { name: RouteName::AdminManageUsers, pattern: "/admin/users", meta: RouteMeta::ADMIN },
    RouteDef { name: RouteName::AdminEditUser, pattern: "/admin/users/:id/edit", meta: RouteMeta::ADMIN },
    RouteDef { name: RouteName::AdminBookings, pattern: "/admin/bookings", meta: RouteMeta::ADMIN },
];

const NOT_FOUND: RouteDef = RouteDef { name: RouteName::NotFound, pattern: "*", meta: RouteMeta::PUBLIC };

/// Unauthenticated entry view.
pub const ENTRY_ROUTE: RouteName = RouteName::Login;
/// Default authenticated landing view.
pub const LANDING_ROUTE: RouteName = RouteName::MyBookings;

impl RouteName {
    /// Canonical path for routes without parameters.
    #[must_use]
    pub fn path(self) -> Option<&'static str> {
        ROUTES
            .iter()
            .find(|def| def.name == self && !def.pattern.contains(':'))
            .map(|def| def.pattern)
    }
}

/// Resolve a requested path (query string allowed) to its route definition.
#[must_use]
pub fn resolve(path: &str) -> RouteDef {
    let bare = path.split(['?', '#']).next().unwrap_or_default();
    ROUTES
        .iter()
        .find(|def| pattern_matches(def.pattern, bare))
        .copied()
        .unwrap_or(NOT_FOUND)
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let path = path.trim_matches('/');
    let pattern = pattern.trim_matches('/');
    if pattern.is_empty() || path.is_empty() {
        return pattern.is_empty() && path.is_empty();
    }

    let mut want = pattern.split('/');
    let mut got = path.split('/');
    loop {
        match (want.next(), got.next()) {
            (None, None) => return true,
            (Some(w), Some(g)) if w.starts_with(':') => {
                if g.is_empty() {
                    return false;
                }
            }
            (Some(w), Some(g)) if w == g => {}
            _ => return false,
        }
    }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Send the visitor to the entry view; `return_to` is the path they asked for.
    RedirectToEntry { return_to: String },
    RedirectToLanding,
}

/// Decide whether navigation to `requested` may proceed.
#[must_use]
pub fn guard(meta: RouteMeta, session: &Session, requested: &str) -> GuardDecision {
    let needs_login = meta.requires_auth || meta.requires_admin;
    if needs_login && !session.is_logged_in() {
        return GuardDecision::RedirectToEntry { return_to: requested.to_owned() };
    }
    if meta.requires_admin && !session.is_admin() {
        return GuardDecision::RedirectToLanding;
    }
    if meta.guest_only && session.is_logged_in() {
        return GuardDecision::RedirectToLanding;
    }
    GuardDecision::Proceed
}

// =============================================================================
// HISTORY
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub route: RouteName,
    pub path: String,
}

impl Location {
    #[must_use]
    pub fn new(route: RouteName, path: impl Into<String>) -> Self {
        Self { route, path: path.into() }
    }

    /// Location of a parameterless route.
    #[must_use]
    pub fn of(route: RouteName) -> Self {
        Self { route, path: route.path().unwrap_or("/").to_owned() }
    }
}

/// Sink for navigation commands issued outside the router (e.g. logout).
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: Location);
}

/// In-memory navigation stack.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<Location>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Location>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn current(&self) -> Option<Location> {
        self.entries().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Navigator for History {
    fn navigate(&self, location: Location) {
        tracing::debug!(path = %location.path, route = ?location.route, "navigate");
        self.entries().push(location);
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub struct Router {
    session: Arc<SessionContext>,
    history: Arc<History>,
    return_to: Mutex<Option<String>>,
}

impl Router {
    #[must_use]
    pub fn new(session: Arc<SessionContext>, history: Arc<History>) -> Self {
        Self { session, history, return_to: Mutex::new(None) }
    }

    /// Guard and perform navigation to `path`, returning where we ended up.
    pub async fn navigate(&self, path: &str) -> Location {
        let route = resolve(path);
        let session = self.session.snapshot().await;
        let location = match guard(route.meta, &session, path) {
            GuardDecision::Proceed => Location::new(route.name, path),
            GuardDecision::RedirectToEntry { return_to } => {
                *self.return_slot() = Some(return_to);
                Location::of(ENTRY_ROUTE)
            }
            GuardDecision::RedirectToLanding => Location::of(LANDING_ROUTE),
        };
        self.history.navigate(location.clone());
        location
    }

    /// Guard decision for `path` without navigating or recording anything.
    pub async fn check(&self, path: &str) -> GuardDecision {
        let route = resolve(path);
        let session = self.session.snapshot().await;
        guard(route.meta, &session, path)
    }

    /// Consume the path remembered by the last entry-view redirect.
    pub fn take_return_path(&self) -> Option<String> {
        self.return_slot().take()
    }

    #[must_use]
    pub fn current(&self) -> Option<Location> {
        self.history.current()
    }

    fn return_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.return_to.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
