//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use armeria_core::prelude::*;
//! ```

// === Wiring and configuration ===
pub use crate::app::{AccessLayer, AccessLayerBuilder};
pub use crate::config::{ArmeriaConfig, DataSource};
pub use crate::logging::init_logging;

// === Credential and HTTP ===
pub use crate::gateway::{Gateway, RequestBody, RequestOptions, SessionEvent};
pub use crate::storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use crate::token::TokenStore;

// === Roles and access ===
pub use crate::guard::{GuardDecision, GuardedView, RouteGuard};
pub use crate::registry::{PermissionChecker, RolePermissionEntry, RoleRegistry};

// === Session ===
pub use crate::session::{
    AuthBackend, HttpAuthBackend, LoginCredentials, MockAuthBackend, ProfileUpdate, SessionManager,
    SessionState, SessionUser, UserId,
};

// === Errors ===
pub use crate::error::{GatewayError, SessionError, StorageError};
