//! Offline authentication backend
//!
//! In-process fixtures for working on the console without a running API.
//! It follows the same contract as the real backend, including rejecting an
//! unknown or revoked token by clearing the credential, announcing
//! [`SessionEvent::Expired`] and failing with [`GatewayError::SessionExpired`].
//!
//! Tokens look like `mock-<user id>.<uuid>` so a credential persisted by one
//! process is still recognized by the next one.

use super::backend::AuthBackend;
use super::user::{
    LoginCredentials, LoginResponse, ProfileUpdate, RoleAssignment, SessionUser, UserId,
};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{SessionEvent, SessionEvents};
use crate::registry::{ADMIN, FINANCE, OPERATIONS, SALES_CHIEF, VENDOR};
use crate::token::TokenStore;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Password shared by every fixture account
pub const MOCK_PASSWORD: &str = "armeria123";

struct MockAccount {
    password: String,
    user: SessionUser,
}

/// Fixture-backed [`AuthBackend`]
pub struct MockAuthBackend {
    tokens: Arc<TokenStore>,
    accounts: Mutex<Vec<MockAccount>>,
    sessions: Mutex<HashMap<String, UserId>>,
    revoked: Mutex<HashSet<String>>,
    events: SessionEvents,
    login_route: String,
}

impl MockAuthBackend {
    /// Backend with one account per role plus a VENDOR+ADMIN supervisor
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        let fixtures: [(i64, &str, &str, &str, &[&str]); 6] = [
            (1, "Admin", "General", "admin@armeria.local", &[ADMIN]),
            (2, "Valeria", "Vendedora", "vendedor@armeria.local", &[VENDOR]),
            (3, "Fernando", "Finanzas", "finanzas@armeria.local", &[FINANCE]),
            (4, "Julia", "Jefa", "jefe.ventas@armeria.local", &[SALES_CHIEF]),
            (5, "Oscar", "Operaciones", "operaciones@armeria.local", &[OPERATIONS]),
            (6, "Sofia", "Supervisora", "supervisor@armeria.local", &[VENDOR, ADMIN]),
        ];

        let accounts = fixtures
            .iter()
            .map(|(id, first, last, email, roles)| MockAccount {
                password: MOCK_PASSWORD.to_string(),
                user: SessionUser {
                    id: Some(UserId::Number(*id)),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: email.to_string(),
                    phone: None,
                    photo: None,
                    roles: roles.iter().map(|r| RoleAssignment::new(r)).collect(),
                },
            })
            .collect();

        Self {
            tokens,
            accounts: Mutex::new(accounts),
            sessions: Mutex::new(HashMap::new()),
            revoked: Mutex::new(HashSet::new()),
            events: SessionEvents::new(),
            login_route: "/login".to_string(),
        }
    }

    /// Announce rejected tokens on a shared hub, usually the gateway's
    pub fn with_events(mut self, events: SessionEvents, login_route: &str) -> Self {
        self.events = events;
        self.login_route = login_route.to_string();
        self
    }

    /// Add an extra account
    pub fn with_account(self, password: &str, user: SessionUser) -> Self {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.push(MockAccount { password: password.to_string(), user });
        }
        self
    }

    /// Number of tokens currently issued
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.revoked.lock().map(|r| r.contains(token)).unwrap_or(true)
    }

    /// Owner encoded in a token issued by an earlier process
    fn owner_from_token(&self, token: &str) -> Option<UserId> {
        let (id, _) = token.strip_prefix("mock-")?.split_once('.')?;
        let id = id.parse::<i64>().map(UserId::Number).unwrap_or_else(|_| UserId::from(id));
        self.find_user(&id).map(|_| id)
    }

    fn find_user(&self, id: &UserId) -> Option<SessionUser> {
        let accounts = self.accounts.lock().ok()?;
        accounts.iter().find(|a| a.user.id.as_ref() == Some(id)).map(|a| a.user.clone())
    }

    fn session_owner(&self, endpoint: &str) -> GatewayResult<UserId> {
        let owner = match self.tokens.get_token() {
            Some(token) if !self.is_revoked(&token) => {
                let issued = self.sessions.lock().ok().and_then(|s| s.get(&token).cloned());
                issued.or_else(|| self.owner_from_token(&token))
            }
            _ => None,
        };
        match owner {
            Some(id) => Ok(id),
            None => {
                log::warn!("Mock {} rejected the credential", endpoint);
                if let Err(e) = self.tokens.clear_token() {
                    log::error!("Failed to clear credential: {}", e);
                }
                self.events.emit(SessionEvent::Expired {
                    endpoint: endpoint.to_string(),
                    redirect_to: self.login_route.clone(),
                });
                Err(GatewayError::SessionExpired)
            }
        }
    }
}

fn api_error(status: StatusCode, message: &str) -> GatewayError {
    GatewayError::Api {
        status,
        message: message.to_string(),
        body: serde_json::json!({ "message": message }),
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> GatewayResult<LoginResponse> {
        let user = {
            let accounts = self
                .accounts
                .lock()
                .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Mock data unavailable"))?;
            accounts
                .iter()
                .find(|a| {
                    a.user.email.eq_ignore_ascii_case(&credentials.email)
                        && a.password == credentials.password
                })
                .map(|a| a.user.clone())
        };

        let user = user.ok_or_else(|| {
            api_error(StatusCode::UNAUTHORIZED, "Invalid email or password")
        })?;
        let id = user.id.clone().ok_or_else(|| {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Fixture user without id")
        })?;

        let token = format!("mock-{}.{}", id, uuid::Uuid::new_v4());
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(token.clone(), id);
        }

        log::debug!("Mock login for {}", user.email);
        Ok(LoginResponse { token, user: Some(user) })
    }

    async fn logout(&self) -> GatewayResult<()> {
        if let Some(token) = self.tokens.get_token() {
            if let Ok(mut sessions) = self.sessions.lock() {
                sessions.remove(&token);
            }
            if let Ok(mut revoked) = self.revoked.lock() {
                revoked.insert(token);
            }
        }
        Ok(())
    }

    async fn current_user(&self) -> GatewayResult<SessionUser> {
        let id = self.session_owner("/auth/me")?;
        self.find_user(&id).ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found"))
    }

    async fn update_user(&self, id: &UserId, update: &ProfileUpdate) -> GatewayResult<SessionUser> {
        let owner = self.session_owner(&format!("/users/{}", id))?;
        if &owner != id {
            return Err(api_error(StatusCode::FORBIDDEN, "Cannot edit another user"));
        }

        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Mock data unavailable"))?;
        let account = accounts
            .iter_mut()
            .find(|a| a.user.id.as_ref() == Some(id))
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found"))?;

        if let Some(email) = &update.email {
            if !email.contains('@') {
                return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid email"));
            }
        }

        update.apply_to(&mut account.user);
        Ok(account.user.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
