//! HTTP request gateway
//!
//! Every backend call goes through [`Gateway::request`], which:
//! - joins the endpoint onto the configured base URL
//! - sets `Content-Type: application/json` unless the body is multipart/binary
//! - adds `Authorization: Bearer <token>` and `X-Active-Role` from the token store
//! - merges caller headers last (caller wins)
//! - on 401 clears the credential, broadcasts [`SessionEvent::Expired`] and
//!   fails with [`GatewayError::SessionExpired`]
//! - on other non-2xx fails with [`GatewayError::Api`] carrying status and body
//! - on 2xx returns the parsed JSON, or `{"success": true}` when the body is
//!   empty or not JSON
//!
//! There is no retry, batching or caching: every failure other than 401 is
//! surfaced to the caller as-is.

mod events;
mod request;

pub use events::{SessionEvent, SessionEvents};
pub use request::{RequestBody, RequestOptions};

use crate::config::{ApiConfig, RoutesConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::token::TokenStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the role the user is acting as
pub const ACTIVE_ROLE_HEADER: &str = "x-active-role";

/// Authenticated JSON client for the console backend
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
    login_route: String,
    tokens: Arc<TokenStore>,
    events: SessionEvents,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("login_route", &self.login_route)
            .finish()
    }
}

impl Gateway {
    /// Create a gateway with the default client settings
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> GatewayResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url, tokens))
    }

    /// Create a gateway from the `[api]` and `[routes]` configuration sections
    pub fn from_config(
        api: &ApiConfig,
        routes: &RoutesConfig,
        tokens: Arc<TokenStore>,
    ) -> GatewayResult<Self> {
        let client =
            reqwest::Client::builder().timeout(Duration::from_secs(api.timeout_secs)).build()?;
        Ok(Self::with_client(client, api.base_url.clone(), tokens)
            .with_login_route(routes.login.clone()))
    }

    /// Create a gateway around an existing client
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            login_route: "/login".to_string(),
            tokens,
            events: SessionEvents::new(),
        }
    }

    /// Route announced in [`SessionEvent::Expired`]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Subscribe to session signals (401 handling)
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Event hub shared with backends that reject credentials on their own
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// The token store this gateway reads credentials from
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'))
    }

    /// Issue one request and return the parsed body
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> GatewayResult<Value> {
        let url = self.url(endpoint);
        let headers = self.build_headers(&options)?;
        let method = options.method.clone();

        let mut builder = self.client.request(options.method, &url).headers(headers);
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Multipart(form) => builder.multipart(form),
            RequestBody::Binary(bytes) => builder.body(bytes),
        };

        log::debug!("{} {}", method, url);

        let response = builder.send().await.map_err(|e| {
            log::error!("Request to {} failed: {}", endpoint, e);
            GatewayError::from(e)
        })?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("{} {} answered 401, clearing session", method, endpoint);
            if let Err(e) = self.tokens.clear_token() {
                log::error!("Failed to clear credential after 401: {}", e);
            }
            self.events.emit(SessionEvent::Expired {
                endpoint: endpoint.to_string(),
                redirect_to: self.login_route.clone(),
            });
            return Err(GatewayError::SessionExpired);
        }

        if !status.is_success() {
            let raw = response.bytes().await.unwrap_or_default();
            let body: Value = serde_json::from_slice(&raw).unwrap_or_else(|_| json!({}));
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Error {}", status.as_u16()));
            log::warn!("{} {} failed with {}: {}", method, endpoint, status.as_u16(), message);
            return Err(GatewayError::Api { status, message, body });
        }

        let raw = response.bytes().await.map_err(|e| {
            log::error!("Failed to read response from {}: {}", endpoint, e);
            GatewayError::from(e)
        })?;

        Ok(serde_json::from_slice(&raw).unwrap_or_else(|_| json!({ "success": true })))
    }

    /// Issue a request and decode the body into `T`
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> GatewayResult<T> {
        let value = self.request(endpoint, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> GatewayResult<T> {
        self.fetch(endpoint, RequestOptions::get()).await
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(endpoint, RequestOptions::post().json(serde_json::to_value(body)?)).await
    }

    pub async fn put<B, T>(&self, endpoint: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(endpoint, RequestOptions::put().json(serde_json::to_value(body)?)).await
    }

    pub async fn patch<B, T>(&self, endpoint: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(endpoint, RequestOptions::patch().json(serde_json::to_value(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> GatewayResult<T> {
        self.fetch(endpoint, RequestOptions::delete()).await
    }

    fn build_headers(&self, options: &RequestOptions) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        if options.body.is_json() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = self.tokens.get_token().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| GatewayError::InvalidHeader(AUTHORIZATION.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if let Some(role) = self.tokens.active_role() {
            let value = HeaderValue::from_str(&role)
                .map_err(|_| GatewayError::InvalidHeader(ACTIVE_ROLE_HEADER.to_string()))?;
            headers.insert(HeaderName::from_static(ACTIVE_ROLE_HEADER), value);
        }

        // Caller headers replace ours key by key
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in options.headers.iter() {
            headers.append(name.clone(), value.clone());
        }

        Ok(headers)
    }
}
