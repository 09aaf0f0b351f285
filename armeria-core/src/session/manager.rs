//! Auth session manager
//!
//! Owns the current [`SessionUser`] and drives the session state machine:
//!
//! ```text
//!  Unauthenticated ──login──▶ Authenticated
//!        ▲   start with token        │
//!        │         ▼                 │
//!        └──fail── Restoring ──ok────┘
//!        └──────── logout / 401 ◀────┘
//! ```
//!
//! Transitions are serialized by a single async mutex, so a profile update
//! issued during restoration waits for it. On top of that every transition
//! reads the session epoch before its network call and re-checks it before
//! committing: logout and 401 expiry bump the epoch first, so a stale answer
//! arriving afterwards is dropped instead of resurrecting the user.

use super::backend::AuthBackend;
use super::user::{LoginCredentials, ProfileUpdate, SessionUser};
use crate::error::{SessionError, SessionResult};
use crate::gateway::SessionEvent;
use crate::registry::RoleRegistry;
use crate::token::TokenStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch, Mutex};

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No user, no credential
    Unauthenticated,
    /// A persisted credential exists; the user is being fetched
    Restoring,
    /// User present and consistent with the credential
    Authenticated(SessionUser),
}

impl SessionState {
    pub fn is_restoring(&self) -> bool {
        matches!(self, SessionState::Restoring)
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Orchestrates login, logout, restoration and profile updates
pub struct SessionManager {
    backend: Arc<dyn AuthBackend>,
    tokens: Arc<TokenStore>,
    registry: Arc<RoleRegistry>,
    state: watch::Sender<SessionState>,
    epoch: AtomicU64,
    transition: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("backend", &self.backend.name())
            .field("state", &*self.state.borrow())
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

impl SessionManager {
    /// Create a manager; the initial state depends on whether a credential
    /// is already persisted (Restoring) or not (Unauthenticated)
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        tokens: Arc<TokenStore>,
        registry: Arc<RoleRegistry>,
    ) -> Self {
        let initial = if tokens.is_authenticated() {
            SessionState::Restoring
        } else {
            SessionState::Unauthenticated
        };
        let (state, _) = watch::channel(initial);

        Self { backend, tokens, registry, state, epoch: AtomicU64::new(0), transition: Mutex::new(()) }
    }

    /// Create a manager and run the start-up restoration
    ///
    /// A failed restoration is logged and leaves the session Unauthenticated.
    pub async fn start(
        backend: Arc<dyn AuthBackend>,
        tokens: Arc<TokenStore>,
        registry: Arc<RoleRegistry>,
    ) -> Arc<Self> {
        let manager = Arc::new(Self::new(backend, tokens, registry));
        if let Err(e) = manager.restore().await {
            log::info!("Session not restored: {}", e);
        }
        manager
    }

    /// Follow gateway signals so a 401 on any call resets the session
    pub fn follow(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired { endpoint, .. }) => {
                        let Some(manager) = weak.upgrade() else { break };
                        log::info!("Session expired on {}", endpoint);
                        manager.expire().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::debug!("Skipped {} session events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Fetch the user for a persisted credential
    pub async fn restore(&self) -> SessionResult<()> {
        let _transition = self.transition.lock().await;

        if !self.tokens.is_authenticated() {
            self.state.send_replace(SessionState::Unauthenticated);
            return Ok(());
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.state.send_replace(SessionState::Restoring);

        match self.backend.current_user().await {
            Ok(user) => {
                if !self.is_current(epoch) || !self.tokens.is_authenticated() {
                    log::debug!("Dropping stale restore for {}", user.email);
                    return Err(SessionError::Superseded);
                }
                log::info!("Session restored for {}", user.email);
                self.state.send_replace(SessionState::Authenticated(user));
                Ok(())
            }
            Err(e) => {
                if self.is_current(epoch) {
                    log::warn!("Session restore failed: {}", e);
                    self.reset();
                }
                Err(e.into())
            }
        }
    }

    /// Sign in, persist the credential and load the full user
    ///
    /// On failure the previous credential and user are left as they were.
    pub async fn login(&self, credentials: &LoginCredentials) -> SessionResult<SessionUser> {
        let _transition = self.transition.lock().await;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let response = self.backend.login(credentials).await?;
        if response.token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        let previous_token = self.tokens.get_token();
        let previous_role = self.tokens.active_role();
        self.tokens.set_token(&response.token)?;
        // The role belongs to the credential it was picked under
        if let Err(e) = self.tokens.clear_active_role() {
            self.put_back(previous_token, previous_role);
            return Err(e.into());
        }

        let user = match self.backend.current_user().await {
            Ok(user) => user,
            Err(e) => {
                self.put_back(previous_token, previous_role);
                return Err(e.into());
            }
        };

        if !self.is_current(epoch) {
            return Err(SessionError::Superseded);
        }

        if let Some(summary_id) = response.user.as_ref().and_then(|u| u.id.as_ref()) {
            if user.id.as_ref() != Some(summary_id) {
                log::warn!("Login answer and /auth/me disagree on the user id");
            }
        }

        self.settle_active_role(&user)?;
        log::info!("User logged in: {} as {:?}", user.email, user.role_codes());
        self.state.send_replace(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// End the session
    ///
    /// The backend is notified best-effort; the credential and user are
    /// cleared unconditionally. Calling it again is harmless.
    pub async fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _transition = self.transition.lock().await;

        if self.tokens.is_authenticated() {
            if let Err(e) = self.backend.logout().await {
                log::warn!("Backend logout failed: {}", e);
            }
        }

        self.reset();
        log::info!("User logged out");
    }

    /// Reset after the backend rejected the credential
    pub async fn expire(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _transition = self.transition.lock().await;
        self.reset();
    }

    /// Persist a profile change and replace the user with the backend's answer
    pub async fn update_profile(&self, update: &ProfileUpdate) -> SessionResult<SessionUser> {
        let _transition = self.transition.lock().await;

        let user = self.user().ok_or(SessionError::NotAuthenticated)?;
        let id = user.id.ok_or(SessionError::MissingUserId)?;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let updated = self.backend.update_user(&id, update).await?;

        if !self.is_current(epoch) {
            return Err(SessionError::Superseded);
        }

        self.state.send_replace(SessionState::Authenticated(updated.clone()));
        Ok(updated)
    }

    /// Act as one of the user's roles; returns that role's landing route
    pub async fn select_role(&self, code: &str) -> SessionResult<String> {
        let _transition = self.transition.lock().await;

        let user = self.user().ok_or(SessionError::NotAuthenticated)?;
        let assignment = user
            .roles
            .iter()
            .find(|r| r.code == crate::registry::normalize_role_code(code))
            .ok_or_else(|| SessionError::RoleNotAssigned(code.to_string()))?;

        self.tokens.set_active_role(&assignment.code)?;
        log::info!("{} now acting as {}", user.email, assignment.code);
        Ok(self.registry.get_redirect_route(&assignment.code).to_string())
    }

    /// Landing route for the current session
    ///
    /// Uses the active role when it is held, otherwise the first assigned
    /// role, otherwise the registry fallback.
    pub fn redirect_route(&self) -> String {
        let Some(user) = self.user() else {
            return self.registry.fallback_route().to_string();
        };

        let role = self
            .tokens
            .active_role()
            .filter(|r| user.has_role(r))
            .or_else(|| user.roles.first().map(|r| r.code.clone()));

        match role {
            Some(code) => self.registry.get_redirect_route(&code).to_string(),
            None => self.registry.fallback_route().to_string(),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current user; never present without a credential
    pub fn user(&self) -> Option<SessionUser> {
        if !self.tokens.is_authenticated() {
            return None;
        }
        self.state.borrow().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_restoring()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn has_role(&self, code: &str) -> bool {
        self.user().is_some_and(|u| u.has_role(code))
    }

    /// Whether the user holds any of `codes` (menu visibility)
    pub fn has_any_role<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        self.user().is_some_and(|u| u.has_any_role(codes))
    }

    pub fn active_role(&self) -> Option<String> {
        self.tokens.active_role()
    }

    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn reset(&self) {
        if let Err(e) = self.tokens.clear_token() {
            log::error!("Failed to clear credential: {}", e);
        }
        self.state.send_replace(SessionState::Unauthenticated);
    }

    /// Single-role users act as that role; a stale active role is dropped
    fn settle_active_role(&self, user: &SessionUser) -> SessionResult<()> {
        match user.roles.as_slice() {
            [only] => self.tokens.set_active_role(&only.code)?,
            _ => {
                if let Some(active) = self.tokens.active_role() {
                    if !user.has_role(&active) {
                        self.tokens.clear_active_role()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn put_back(&self, token: Option<String>, role: Option<String>) {
        let result = match token {
            Some(token) => self.tokens.set_token(&token).and_then(|_| match role {
                Some(role) => self.tokens.set_active_role(&role),
                None => self.tokens.clear_active_role(),
            }),
            None => self.tokens.clear_token(),
        };
        if let Err(e) = result {
            log::error!("Failed to restore previous credential: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, GatewayResult};
    use crate::registry::{ADMIN, VENDOR};
    use crate::session::mock::{MockAuthBackend, MOCK_PASSWORD};
    use crate::session::user::{LoginResponse, RoleAssignment, UserId};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn registry() -> Arc<RoleRegistry> {
        Arc::new(RoleRegistry::builtin().clone())
    }

    fn mock_manager() -> (Arc<TokenStore>, SessionManager) {
        let tokens = Arc::new(TokenStore::in_memory());
        let backend = Arc::new(MockAuthBackend::new(tokens.clone()));
        let manager = SessionManager::new(backend, tokens.clone(), registry());
        (tokens, manager)
    }

    fn user(id: i64, roles: &[&str]) -> SessionUser {
        SessionUser {
            id: Some(UserId::Number(id)),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: format!("user{}@example.com", id),
            phone: None,
            photo: None,
            roles: roles.iter().map(|r| RoleAssignment::new(r)).collect(),
        }
    }

    /// Backend whose `current_user` blocks until released
    struct GatedBackend {
        gate: Notify,
        entered: Notify,
        me_calls: AtomicUsize,
        fail_me: bool,
    }

    impl GatedBackend {
        fn new(fail_me: bool) -> Self {
            Self { gate: Notify::new(), entered: Notify::new(), me_calls: AtomicUsize::new(0), fail_me }
        }
    }

    #[async_trait]
    impl AuthBackend for GatedBackend {
        async fn login(&self, _: &LoginCredentials) -> GatewayResult<LoginResponse> {
            Ok(LoginResponse { token: "fresh".to_string(), user: Some(user(1, &[VENDOR])) })
        }
        async fn logout(&self) -> GatewayResult<()> {
            Err(GatewayError::Api {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                message: "down".to_string(),
                body: serde_json::json!({}),
            })
        }
        async fn current_user(&self) -> GatewayResult<SessionUser> {
            self.me_calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.gate.notified().await;
            if self.fail_me {
                Err(GatewayError::SessionExpired)
            } else {
                Ok(user(1, &[VENDOR]))
            }
        }
        async fn update_user(&self, _: &UserId, update: &ProfileUpdate) -> GatewayResult<SessionUser> {
            let mut u = user(1, &[VENDOR]);
            update.apply_to(&mut u);
            Ok(u)
        }
        fn name(&self) -> &str {
            "gated"
        }
    }

    /// Backend that uses the email as the token and notes the active role
    /// present on every `/auth/me`
    struct ScriptedBackend {
        tokens: Arc<TokenStore>,
        roles_seen: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl ScriptedBackend {
        fn new(tokens: Arc<TokenStore>) -> Self {
            Self { tokens, roles_seen: std::sync::Mutex::new(Vec::new()) }
        }

        fn last_role_seen(&self) -> Option<String> {
            self.roles_seen.lock().unwrap().last().cloned().flatten()
        }
    }

    #[async_trait]
    impl AuthBackend for ScriptedBackend {
        async fn login(&self, credentials: &LoginCredentials) -> GatewayResult<LoginResponse> {
            Ok(LoginResponse { token: credentials.email.clone(), user: None })
        }
        async fn logout(&self) -> GatewayResult<()> {
            Ok(())
        }
        async fn current_user(&self) -> GatewayResult<SessionUser> {
            self.roles_seen.lock().unwrap().push(self.tokens.active_role());
            match self.tokens.get_token().as_deref() {
                Some("finance") => Ok(user(3, &["FINANCE"])),
                Some("supervisor") => Ok(user(6, &[VENDOR, ADMIN])),
                Some("auditor") => Ok(user(7, &[ADMIN, "FINANCE"])),
                _ => Err(GatewayError::Api {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    message: "boom".to_string(),
                    body: serde_json::json!({ "message": "boom" }),
                }),
            }
        }
        async fn update_user(&self, _: &UserId, _: &ProfileUpdate) -> GatewayResult<SessionUser> {
            unreachable!()
        }
        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn scripted_manager() -> (Arc<TokenStore>, Arc<ScriptedBackend>, SessionManager) {
        let tokens = Arc::new(TokenStore::in_memory());
        let backend = Arc::new(ScriptedBackend::new(tokens.clone()));
        let manager = SessionManager::new(backend.clone(), tokens.clone(), registry());
        (tokens, backend, manager)
    }

    #[tokio::test]
    async fn test_relogin_does_not_carry_previous_role() {
        let (tokens, backend, manager) = scripted_manager();

        manager.login(&LoginCredentials::new("finance", "x")).await.unwrap();
        assert_eq!(tokens.active_role().as_deref(), Some("FINANCE"));

        manager.login(&LoginCredentials::new("supervisor", "x")).await.unwrap();
        assert_eq!(backend.last_role_seen(), None);
        assert!(tokens.active_role().is_none());

        manager.select_role(ADMIN).await.unwrap();
        manager.login(&LoginCredentials::new("auditor", "x")).await.unwrap();
        assert_eq!(backend.last_role_seen(), None);
        // The new user holds ADMIN too but never picked it
        assert!(tokens.active_role().is_none());
        assert_eq!(manager.user().unwrap().id, Some(UserId::Number(7)));
    }

    #[tokio::test]
    async fn test_failed_relogin_keeps_live_session() {
        let (tokens, _, manager) = scripted_manager();
        let signed_in = manager.login(&LoginCredentials::new("supervisor", "x")).await.unwrap();
        manager.select_role(ADMIN).await.unwrap();

        let err = manager.login(&LoginCredentials::new("broken", "x")).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Gateway(GatewayError::Api { status: reqwest::StatusCode::INTERNAL_SERVER_ERROR, .. })
        ));

        assert_eq!(tokens.get_token().as_deref(), Some("supervisor"));
        assert_eq!(tokens.active_role().as_deref(), Some(ADMIN));
        assert_eq!(manager.state(), SessionState::Authenticated(signed_in));
        assert_eq!(manager.redirect_route(), "/admin");
    }

    #[tokio::test]
    async fn test_start_without_credential_is_unauthenticated() {
        let (_, manager) = mock_manager();
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!manager.is_loading());
        manager.restore().await.unwrap();
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_start_with_credential_is_restoring() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token("persisted").unwrap();
        let backend = Arc::new(GatedBackend::new(false));
        let manager = SessionManager::new(backend, tokens, registry());
        assert!(manager.is_loading());
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let (tokens, manager) = mock_manager();
        let user = manager
            .login(&LoginCredentials::new("vendedor@armeria.local", MOCK_PASSWORD))
            .await
            .unwrap();

        assert_eq!(user.id, Some(UserId::Number(2)));
        assert_eq!(manager.user().unwrap().id, Some(UserId::Number(2)));
        assert!(manager.is_authenticated());
        assert!(tokens.is_authenticated());
        // Single-role users act as that role right away
        assert_eq!(manager.active_role().as_deref(), Some(VENDOR));
        assert_eq!(manager.redirect_route(), "/vendedor");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_untouched() {
        let (tokens, manager) = mock_manager();
        let err = manager
            .login(&LoginCredentials::new("vendedor@armeria.local", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Gateway(GatewayError::Api { .. })));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!tokens.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_twice() {
        let (tokens, manager) = mock_manager();
        manager
            .login(&LoginCredentials::new("admin@armeria.local", MOCK_PASSWORD))
            .await
            .unwrap();

        manager.logout().await;
        assert!(!tokens.is_authenticated());
        assert!(manager.user().is_none());

        manager.logout().await;
        assert!(!tokens.is_authenticated());
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_survives_backend_failure() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token("t").unwrap();
        let manager = SessionManager::new(Arc::new(GatedBackend::new(false)), tokens.clone(), registry());

        manager.logout().await;
        assert!(!tokens.is_authenticated());
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_multi_role_user_selects_role() {
        let (tokens, manager) = mock_manager();
        manager
            .login(&LoginCredentials::new("supervisor@armeria.local", MOCK_PASSWORD))
            .await
            .unwrap();

        assert!(manager.has_any_role(&[VENDOR, ADMIN]));
        assert!(manager.active_role().is_none());
        assert_eq!(manager.redirect_route(), "/vendedor");

        let route = manager.select_role("admin").await.unwrap();
        assert_eq!(route, "/admin");
        assert_eq!(tokens.active_role().as_deref(), Some(ADMIN));
        assert_eq!(manager.redirect_route(), "/admin");

        let err = manager.select_role("FINANCE").await.unwrap_err();
        assert!(matches!(err, SessionError::RoleNotAssigned(_)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (_, manager) = mock_manager();

        let update = ProfileUpdate { first_name: Some("Valentina".to_string()), ..Default::default() };
        assert!(matches!(
            manager.update_profile(&update).await,
            Err(SessionError::NotAuthenticated)
        ));

        manager
            .login(&LoginCredentials::new("vendedor@armeria.local", MOCK_PASSWORD))
            .await
            .unwrap();
        let updated = manager.update_profile(&update).await.unwrap();
        assert_eq!(updated.first_name, "Valentina");
        assert_eq!(manager.user().unwrap().first_name, "Valentina");

        let bad = ProfileUpdate { email: Some("not-an-email".to_string()), ..Default::default() };
        assert!(manager.update_profile(&bad).await.is_err());
        assert_eq!(manager.user().unwrap().first_name, "Valentina");
        assert_eq!(manager.user().unwrap().email, "vendedor@armeria.local");
    }

    #[tokio::test]
    async fn test_restore_with_expired_token() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token("expired").unwrap();
        let backend = Arc::new(MockAuthBackend::new(tokens.clone()));

        let manager = SessionManager::start(backend, tokens.clone(), registry()).await;
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!tokens.is_authenticated());
    }

    #[tokio::test]
    async fn test_stale_restore_does_not_resurrect_user() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token("persisted").unwrap();
        let backend = Arc::new(GatedBackend::new(false));
        let manager = Arc::new(SessionManager::new(backend.clone(), tokens.clone(), registry()));

        let restoring = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.restore().await })
        };
        backend.entered.notified().await;

        let logging_out = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.logout().await })
        };
        tokio::task::yield_now().await;

        backend.gate.notify_one();
        let restored = restoring.await.unwrap();
        logging_out.await.unwrap();

        assert!(matches!(restored, Err(SessionError::Superseded)));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(!tokens.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_waits_for_restore() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set_token("persisted").unwrap();
        let backend = Arc::new(GatedBackend::new(false));
        let manager = Arc::new(SessionManager::new(backend.clone(), tokens.clone(), registry()));

        let restoring = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.restore().await })
        };
        backend.entered.notified().await;

        let updating = {
            let manager = manager.clone();
            tokio::spawn(async move {
                let update = ProfileUpdate { last_name: Some("Queued".to_string()), ..Default::default() };
                manager.update_profile(&update).await
            })
        };
        tokio::task::yield_now().await;
        assert!(manager.is_loading());

        backend.gate.notify_one();
        restoring.await.unwrap().unwrap();
        let updated = updating.await.unwrap().unwrap();
        assert_eq!(updated.last_name, "Queued");
        assert_eq!(manager.user().unwrap().last_name, "Queued");
    }

    #[tokio::test]
    async fn test_login_second_step_failure_restores_previous_credential() {
        let tokens = Arc::new(TokenStore::in_memory());
        let backend = Arc::new(GatedBackend::new(true));
        let manager = Arc::new(SessionManager::new(backend.clone(), tokens.clone(), registry()));

        let login = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.login(&LoginCredentials::new("a@b.c", "x")).await })
        };
        backend.entered.notified().await;
        backend.gate.notify_one();

        assert!(login.await.unwrap().is_err());
        assert!(!tokens.is_authenticated());
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_expire_clears_session() {
        let (tokens, manager) = mock_manager();
        manager
            .login(&LoginCredentials::new("finanzas@armeria.local", MOCK_PASSWORD))
            .await
            .unwrap();

        manager.expire().await;
        assert!(!tokens.is_authenticated());
        assert!(manager.user().is_none());
        assert_eq!(manager.redirect_route(), "/dashboard");
    }
}
