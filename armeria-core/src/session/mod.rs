//! Authenticated session
//!
//! [`SessionManager`] holds the current user and runs login, logout,
//! restoration and profile updates against an [`AuthBackend`]. The backend is
//! either the real REST API ([`HttpAuthBackend`]) or in-process fixtures
//! ([`MockAuthBackend`]), picked from `api.data_source`.

mod backend;
mod manager;
mod mock;
mod user;

pub use backend::{AuthBackend, HttpAuthBackend};
pub use manager::{SessionManager, SessionState};
pub use mock::{MockAuthBackend, MOCK_PASSWORD};
pub use user::{
    LoginCredentials, LoginResponse, ProfileUpdate, RoleAssignment, SessionUser, UserId,
};
