//! Role table override

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// TOML role table replacing the built-in one
    /// Env: ARMERIA_REGISTRY_PATH
    pub path: Option<String>,
}

impl RegistryConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(path) = env::var("ARMERIA_REGISTRY_PATH") {
            self.path = Some(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if !std::path::Path::new(path).exists() {
                bail!("Role table not found: {}", path);
            }
        }
        Ok(())
    }
}
