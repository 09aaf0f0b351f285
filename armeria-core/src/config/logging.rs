//! Logging configuration

use crate::logging::{self, LogFormat, LogLevel};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env: ARMERIA_LOG_LEVEL
    pub level: String,
    /// human, json or logfmt
    /// Env: ARMERIA_LOG_FORMAT
    pub format: String,
    pub context_fields: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string(), context_fields: BTreeMap::new() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("ARMERIA_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("ARMERIA_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.to_logger_config().map(|_| ())
    }

    /// Settings for [`logging::init_logging`]
    pub fn to_logger_config(&self) -> Result<logging::LoggingConfig> {
        let level: LogLevel = self.level.parse().map_err(|e: String| anyhow!(e))?;
        let format: LogFormat = self.format.parse().map_err(|e: String| anyhow!(e))?;
        Ok(logging::LoggingConfig { level, format, context_fields: self.context_fields.clone() })
    }
}
