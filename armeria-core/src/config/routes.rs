//! Navigation targets used by the gateway and the route guard

use crate::registry::DEFAULT_FALLBACK_ROUTE;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Where unauthenticated users are sent
    pub login: String,
    /// Where authenticated users without the required role are sent
    pub unauthorized: String,
    /// Landing route for unknown roles
    pub fallback: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
            fallback: DEFAULT_FALLBACK_ROUTE.to_string(),
        }
    }
}

impl RoutesConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn validate(&self) -> Result<()> {
        for (name, route) in [
            ("login", &self.login),
            ("unauthorized", &self.unauthorized),
            ("fallback", &self.fallback),
        ] {
            if !route.starts_with('/') {
                bail!("Invalid routes.{}: {} must start with /", name, route);
            }
        }
        Ok(())
    }
}
