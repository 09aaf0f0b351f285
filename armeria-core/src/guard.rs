//! Route guard
//!
//! Decides whether a protected view may render for the current session:
//!
//! - Restoring → [`GuardDecision::Loading`] (nothing shown, no redirect yet)
//! - Unauthenticated → redirect to the login route
//! - Authenticated → admit if the required role check passes, otherwise
//!   redirect to the unauthorized route
//!
//! Malformed role data resolves to a redirect, never to admission.
//!
//! Example:
//! ```ignore
//! let view = GuardedView::new(
//!     RouteGuard::RequireRole { roles: vec!["FINANCE".into()], redirect_to: None },
//!     session.clone(),
//!     config.routes.clone(),
//! );
//! match view.resolve().await {
//!     Some(GuardDecision::Admit) => render(),
//!     Some(GuardDecision::Redirect(to)) => navigate(&to),
//!     _ => {}
//! }
//! ```

use crate::config::RoutesConfig;
use crate::registry::PermissionChecker;
use crate::session::{SessionManager, SessionState, SessionUser};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// What the view layer should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session is being restored; render a neutral placeholder
    Loading,
    /// Navigate elsewhere
    Redirect(String),
    /// Render the protected content
    Admit,
}

/// Access requirement of a protected view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuard {
    /// Any authenticated user
    RequireAuth,

    /// A user holding at least one of `roles`
    RequireRole {
        roles: Vec<String>,
        /// Where to send users lacking the role (None = routes.unauthorized)
        redirect_to: Option<String>,
    },

    /// A user with at least one role allowed on `route` by the registry
    RequireRouteAccess { route: String },
}

/// Role data the guard refuses to reason about
#[derive(Debug, thiserror::Error)]
enum AccessError {
    #[error("user holds a role with an empty code")]
    EmptyRoleCode,
    #[error("required role list contains an empty code")]
    EmptyRequirement,
    #[error("route {0} is not absolute")]
    RelativeRoute(String),
}

impl RouteGuard {
    /// Decide for a session state
    pub fn evaluate(
        &self,
        state: &SessionState,
        checker: &dyn PermissionChecker,
        routes: &RoutesConfig,
    ) -> GuardDecision {
        let user = match state {
            SessionState::Restoring => return GuardDecision::Loading,
            SessionState::Unauthenticated => return GuardDecision::Redirect(routes.login.clone()),
            SessionState::Authenticated(user) => user,
        };

        match self.resolve_access(user, checker) {
            Ok(true) => GuardDecision::Admit,
            Ok(false) => GuardDecision::Redirect(self.denied_route(routes)),
            Err(e) => {
                log::warn!("Access denied for {}: {}", user.email, e);
                GuardDecision::Redirect(self.denied_route(routes))
            }
        }
    }

    fn resolve_access(
        &self,
        user: &SessionUser,
        checker: &dyn PermissionChecker,
    ) -> Result<bool, AccessError> {
        if user.roles.iter().any(|r| r.code.is_empty()) {
            return Err(AccessError::EmptyRoleCode);
        }

        match self {
            RouteGuard::RequireAuth => Ok(true),
            RouteGuard::RequireRole { roles, .. } => {
                if roles.iter().any(|r| r.trim().is_empty()) {
                    return Err(AccessError::EmptyRequirement);
                }
                Ok(user.has_any_role(roles.as_slice()))
            }
            RouteGuard::RequireRouteAccess { route } => {
                if !route.starts_with('/') {
                    return Err(AccessError::RelativeRoute(route.clone()));
                }
                Ok(user.roles.iter().any(|r| checker.can_access_route(&r.code, route)))
            }
        }
    }

    fn denied_route(&self, routes: &RoutesConfig) -> String {
        match self {
            RouteGuard::RequireRole { redirect_to: Some(to), .. } => to.clone(),
            _ => routes.unauthorized.clone(),
        }
    }
}

/// A guard bound to one mounted view
///
/// Clones share the liveness flag: once any clone calls
/// [`unmount`](Self::unmount), pending and later resolutions return `None`
/// and record nothing.
#[derive(Clone)]
pub struct GuardedView {
    guard: RouteGuard,
    session: Arc<SessionManager>,
    checker: Arc<dyn PermissionChecker>,
    routes: RoutesConfig,
    mounted: Arc<AtomicBool>,
    last: Arc<Mutex<Option<GuardDecision>>>,
}

impl std::fmt::Debug for GuardedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedView")
            .field("guard", &self.guard)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

impl GuardedView {
    /// Mount a view checked against the session's registry
    pub fn new(guard: RouteGuard, session: Arc<SessionManager>, routes: RoutesConfig) -> Self {
        let checker: Arc<dyn PermissionChecker> = session.registry().clone();
        Self::with_checker(guard, session, checker, routes)
    }

    /// Mount a view with a custom permission checker
    pub fn with_checker(
        guard: RouteGuard,
        session: Arc<SessionManager>,
        checker: Arc<dyn PermissionChecker>,
        routes: RoutesConfig,
    ) -> Self {
        Self {
            guard,
            session,
            checker,
            routes,
            mounted: Arc::new(AtomicBool::new(true)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Decision for the session as it is right now
    pub fn decide(&self) -> GuardDecision {
        self.guard.evaluate(&self.current_state(), self.checker.as_ref(), &self.routes)
    }

    /// Wait until restoration settles, then decide
    ///
    /// Returns `None` if the view was unmounted before the decision was made.
    pub async fn resolve(&self) -> Option<GuardDecision> {
        let mut changes = self.session.subscribe();
        if changes.wait_for(|state| !state.is_restoring()).await.is_err() {
            return None;
        }

        if !self.is_mounted() {
            log::debug!("View unmounted before access check completed");
            return None;
        }

        let decision = self.decide();
        if let Ok(mut last) = self.last.lock() {
            if self.is_mounted() {
                *last = Some(decision.clone());
            }
        }
        Some(decision)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Last decision recorded by [`resolve`](Self::resolve)
    pub fn last_decision(&self) -> Option<GuardDecision> {
        self.last.lock().ok().and_then(|d| d.clone())
    }

    /// State as seen through the manager, so a cleared credential reads as
    /// unauthenticated even before the state channel catches up
    fn current_state(&self) -> SessionState {
        match self.session.user() {
            Some(user) => SessionState::Authenticated(user),
            None if self.session.is_loading() => SessionState::Restoring,
            None => SessionState::Unauthenticated,
        }
    }
}
