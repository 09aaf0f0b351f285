//! Error types shared across the access-control layer
//!
//! Every boundary returns a typed error so callers can match on the failure
//! class: transport and authorization problems come from the gateway,
//! state-machine violations from the session manager, and persistence
//! problems from the durable storage backends.

use reqwest::StatusCode;

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Session manager result type
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by the HTTP request gateway
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// The backend answered 401; the credential has already been cleared
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Any other non-2xx answer, with the parsed error body (`{}` when absent)
    #[error("{message}")]
    Api { status: StatusCode, message: String, body: serde_json::Value },

    /// No response was received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A header value could not be encoded
    #[error("Invalid header value for {0}")]
    InvalidHeader(String),

    /// A successful body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            GatewayError::Api { status, .. } => Some(*status),
            GatewayError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Whether this error means the session is no longer valid
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Errors raised by the durable key-value storage
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Errors raised by the auth session manager
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("No authenticated session")]
    NotAuthenticated,
    #[error("Current user has no id")]
    MissingUserId,
    #[error("Role {0} is not assigned to the current user")]
    RoleNotAssigned(String),
    #[error("Login response did not contain a token")]
    MissingToken,
    /// A later transition (logout, expiry) invalidated this one before it committed
    #[error("Session changed while the request was in flight")]
    Superseded,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether the underlying cause is an expired or rejected credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Gateway(e) if e.is_unauthorized())
    }
}
