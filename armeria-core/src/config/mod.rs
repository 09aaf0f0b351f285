//! Layered configuration
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment variables** (`ARMERIA_*`)
//! 2. **Config file** (`armeria.toml`)
//! 3. **Defaults**
//!
//! ```toml
//! [api]
//! base_url = "https://erp.example.com/api"
//! data_source = "api"
//!
//! [storage]
//! path = "/var/lib/armeria/storage.json"
//!
//! [routes]
//! login = "/login"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

pub mod api;
pub mod logging;
pub mod registry;
pub mod routes;
pub mod storage;

pub use api::{ApiConfig, DataSource};
pub use logging::LoggingConfig;
pub use registry::RegistryConfig;
pub use routes::RoutesConfig;
pub use storage::StorageConfig;

use crate::registry::RoleRegistry;
use crate::storage::FileStorage;
use crate::token::TokenStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "armeria.toml";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmeriaConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub routes: RoutesConfig,
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,
}

impl ArmeriaConfig {
    /// Defaults, then `armeria.toml` if present, then environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`load`](Self::load) with an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();
        Ok(config)
    }

    /// Parse a TOML file; missing sections and keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.api.merge(other.api);
        self.storage.merge(other.storage);
        self.routes.merge(other.routes);
        self.logging.merge(other.logging);
        self.registry.merge(other.registry);
    }

    pub fn apply_env_vars(&mut self) {
        self.api.apply_env_vars();
        self.storage.apply_env_vars();
        self.logging.apply_env_vars();
        self.registry.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.storage.validate()?;
        self.routes.validate()?;
        self.logging.validate()?;
        self.registry.validate()?;
        Ok(())
    }

    /// Token store over the configured credential file
    pub fn open_token_store(&self) -> Result<TokenStore> {
        let storage = FileStorage::open(&self.storage.path)
            .with_context(|| format!("Failed to open credential storage {}", self.storage.path))?;
        Ok(TokenStore::with_keys(
            Arc::new(storage),
            self.storage.token_key.clone(),
            self.storage.active_role_key.clone(),
        ))
    }

    /// The configured role table, or the built-in one
    pub fn load_registry(&self) -> Result<RoleRegistry> {
        match &self.registry.path {
            Some(path) => RoleRegistry::from_file(path),
            None => Ok(RoleRegistry::builtin().clone().with_fallback_route(self.routes.fallback.clone())),
        }
    }
}
