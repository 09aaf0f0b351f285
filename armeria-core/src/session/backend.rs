//! Data-access strategy for authentication calls
//!
//! The session manager talks to an [`AuthBackend`]; which one is used is an
//! explicit choice made when the manager is built (see `api.data_source`),
//! never a runtime reachability check.

use super::user::{LoginCredentials, LoginResponse, ProfileUpdate, SessionUser, UserId};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Gateway, RequestOptions};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Authentication endpoints consumed by the session manager
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token (`POST /auth/login`)
    async fn login(&self, credentials: &LoginCredentials) -> GatewayResult<LoginResponse>;

    /// Tell the backend the session ends (`POST /auth/logout`)
    async fn logout(&self) -> GatewayResult<()>;

    /// Full profile of the token's owner (`GET /auth/me`)
    async fn current_user(&self) -> GatewayResult<SessionUser>;

    /// Persist a profile change (`PUT /users/{id}`)
    async fn update_user(&self, id: &UserId, update: &ProfileUpdate) -> GatewayResult<SessionUser>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Backend calling the real REST API through the gateway
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    gateway: Gateway,
}

impl HttpAuthBackend {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> GatewayResult<LoginResponse> {
        match self.gateway.post("/auth/login", credentials).await {
            // A 401 here means wrong credentials, not an expired session
            Err(GatewayError::SessionExpired) => Err(GatewayError::Api {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid email or password".to_string(),
                body: serde_json::json!({}),
            }),
            other => other,
        }
    }

    async fn logout(&self) -> GatewayResult<()> {
        self.gateway.request("/auth/logout", RequestOptions::post()).await?;
        Ok(())
    }

    async fn current_user(&self) -> GatewayResult<SessionUser> {
        self.gateway.get("/auth/me").await
    }

    async fn update_user(&self, id: &UserId, update: &ProfileUpdate) -> GatewayResult<SessionUser> {
        let endpoint = format!("/users/{}", urlencoding::encode(&id.to_string()));
        self.gateway.put(&endpoint, update).await
    }

    fn name(&self) -> &str {
        "api"
    }
}
