//! Builder pattern for AccessLayer

use super::AccessLayer;
use crate::config::{ArmeriaConfig, DataSource};
use crate::gateway::Gateway;
use crate::registry::RoleRegistry;
use crate::session::{AuthBackend, HttpAuthBackend, MockAuthBackend, SessionManager};
use crate::token::TokenStore;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Builder for [`AccessLayer`]
pub struct AccessLayerBuilder {
    config: ArmeriaConfig,
    tokens: Option<Arc<TokenStore>>,
    registry: Option<Arc<RoleRegistry>>,
    backend: Option<Arc<dyn AuthBackend>>,
}

impl AccessLayerBuilder {
    /// Builder over `armeria.toml` and the environment, or defaults when
    /// loading fails
    pub fn new() -> Self {
        Self::with_config(ArmeriaConfig::load().unwrap_or_default())
    }

    pub fn with_config(config: ArmeriaConfig) -> Self {
        Self { config, tokens: None, registry: None, backend: None }
    }

    /// Set the backend base URL (overrides config file and env vars)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn with_data_source(mut self, source: DataSource) -> Self {
        self.config.api.data_source = source.to_string();
        self
    }

    /// Use this token store instead of the configured credential file
    pub fn with_token_store(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Use this role table instead of the configured one
    pub fn with_registry(mut self, registry: RoleRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Use a custom authentication backend, ignoring `api.data_source`
    pub fn with_backend(mut self, backend: Arc<dyn AuthBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Wire everything together and restore a persisted session
    pub async fn build(self) -> Result<AccessLayer> {
        self.config.validate().context("Invalid configuration")?;

        let tokens = match self.tokens {
            Some(tokens) => tokens,
            None => Arc::new(self.config.open_token_store()?),
        };
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(self.config.load_registry()?),
        };

        let gateway = Gateway::from_config(&self.config.api, &self.config.routes, tokens.clone())
            .context("Failed to build HTTP client")?;

        let backend: Arc<dyn AuthBackend> = match self.backend {
            Some(backend) => backend,
            None => match self.config.api.data_source()? {
                DataSource::Api => Arc::new(HttpAuthBackend::new(gateway.clone())),
                DataSource::Mock => Arc::new(
                    MockAuthBackend::new(tokens.clone())
                        .with_events(gateway.events().clone(), gateway.login_route()),
                ),
            },
        };
        log::debug!("Authentication backend: {}", backend.name());

        let session = SessionManager::start(backend, tokens.clone(), registry.clone()).await;
        let follower = session.follow(gateway.subscribe());

        Ok(AccessLayer { config: self.config, tokens, gateway, registry, session, follower })
    }
}

impl Default for AccessLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
