//! Credential storage configuration

use crate::token::{DEFAULT_ACTIVE_ROLE_KEY, DEFAULT_TOKEN_KEY};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the persisted credential
    /// Env: ARMERIA_STORAGE_PATH
    pub path: String,
    pub token_key: String,
    pub active_role_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./.armeria/storage.json".to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            active_role_key: DEFAULT_ACTIVE_ROLE_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(path) = env::var("ARMERIA_STORAGE_PATH") {
            self.path = path;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            bail!("Invalid storage.path: cannot be empty");
        }
        if self.token_key.is_empty() || self.active_role_key.is_empty() {
            bail!("Invalid storage keys: cannot be empty");
        }
        if self.token_key == self.active_role_key {
            bail!("Invalid storage keys: token_key and active_role_key must differ");
        }
        Ok(())
    }
}
