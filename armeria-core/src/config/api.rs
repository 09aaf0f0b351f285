//! Backend API configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Where authentication calls are served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// The REST API at `base_url`
    Api,
    /// In-process fixtures
    Mock,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(DataSource::Api),
            "mock" => Ok(DataSource::Mock),
            other => bail!("Unknown data source: {} (expected \"api\" or \"mock\")", other),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Api => write!(f, "api"),
            DataSource::Mock => write!(f, "mock"),
        }
    }
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint is joined onto
    /// Env: ARMERIA_API_URL
    /// Default: "http://localhost:8080/api"
    pub base_url: String,

    /// Request timeout in seconds
    /// Env: ARMERIA_API_TIMEOUT
    /// Default: 30
    pub timeout_secs: u64,

    /// "api" or "mock"
    /// Env: ARMERIA_DATA_SOURCE
    /// Default: "api"
    pub data_source: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
            data_source: "api".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.timeout_secs = other.timeout_secs;
        self.data_source = other.data_source;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(url) = env::var("ARMERIA_API_URL") {
            self.base_url = url;
        }

        if let Ok(timeout) = env::var("ARMERIA_API_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }

        if let Ok(source) = env::var("ARMERIA_DATA_SOURCE") {
            self.data_source = source;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("Invalid api.base_url: cannot be empty");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!("Invalid api.base_url: {} must start with http:// or https://", self.base_url);
        }
        if self.timeout_secs == 0 {
            bail!("Invalid api.timeout_secs: must be greater than 0");
        }
        self.data_source()?;
        Ok(())
    }

    /// Parsed data source
    pub fn data_source(&self) -> Result<DataSource> {
        self.data_source.parse()
    }
}
