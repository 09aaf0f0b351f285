//! Role/permission registry
//!
//! Static table mapping role codes to allowed routes, permission strings and
//! the post-login redirect. Loaded once at start and never mutated, so it is
//! shared without locking.
//!
//! Every lookup is total: an unknown role code is denied every route and
//! every permission, and is redirected to the generic fallback route.
//!
//! # Example
//! ```rust,ignore
//! let registry = RoleRegistry::builtin();
//! assert!(registry.check_route_access("VENDOR", "/vendedor/clients"));
//! assert_eq!(registry.get_redirect_route("UNKNOWN"), "/dashboard");
//! ```

mod matcher;
mod roles;

pub use matcher::{RouteMatcher, WILDCARD};
pub use roles::{
    builtin_roles, RolePermissionEntry, ADMIN, DEFAULT_FALLBACK_ROUTE, FINANCE, OPERATIONS,
    SALES_CHIEF, VENDOR,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

lazy_static::lazy_static! {
    static ref BUILTIN: RoleRegistry = RoleRegistry::new(builtin_roles());
}

/// Trait for checking if a role has a specific permission
///
/// The session manager and route guard only depend on this seam, so an
/// application can plug in its own rules.
pub trait PermissionChecker: Send + Sync {
    /// Check if a given role has the specified permission
    fn has_permission(&self, role: &str, permission: &str) -> bool;

    /// Check if a given role may open the specified route
    fn can_access_route(&self, role: &str, route: &str) -> bool;
}

/// Immutable role table
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    entries: BTreeMap<String, RolePermissionEntry>,
    fallback_route: String,
}

/// On-disk shape of a role table override
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default = "default_fallback")]
    fallback_route: String,
    roles: BTreeMap<String, RolePermissionEntry>,
}

/// Canonical form of a role code: trimmed and upper-cased
pub fn normalize_role_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_ROUTE.to_string()
}

impl RoleRegistry {
    /// Build a registry from entries keyed by role code
    pub fn new(entries: BTreeMap<String, RolePermissionEntry>) -> Self {
        Self { entries, fallback_route: DEFAULT_FALLBACK_ROUTE.to_string() }
    }

    /// The built-in role table, created on first use
    pub fn builtin() -> &'static RoleRegistry {
        &BUILTIN
    }

    /// Override the generic fallback route
    pub fn with_fallback_route(mut self, route: impl Into<String>) -> Self {
        self.fallback_route = route.into();
        self
    }

    /// Parse a role table from TOML
    ///
    /// ```toml
    /// fallback_route = "/dashboard"
    ///
    /// [roles.VENDOR]
    /// name = "Vendedor"
    /// routes = ["/vendedor", "/vendedor/*"]
    /// permissions = ["clients:read"]
    /// redirect = "/vendedor"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content).context("Failed to parse role table")?;

        let mut entries = BTreeMap::new();
        for (code, mut entry) in file.roles {
            let code = normalize_role_code(&code);
            if !entry.redirect.starts_with('/') {
                bail!("Invalid redirect for role {}: {}", code, entry.redirect);
            }
            entry.code = code.clone();
            if entries.insert(code.clone(), entry).is_some() {
                bail!("Role {} is defined twice", code);
            }
        }

        Ok(Self { entries, fallback_route: file.fallback_route })
    }

    /// Load a role table from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read role table: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid role table: {}", path.display()))
    }

    /// True iff `route` matches one of the role's allowed patterns
    pub fn check_route_access(&self, role: &str, route: &str) -> bool {
        self.entries
            .get(role)
            .is_some_and(|entry| RouteMatcher::matches_any(&entry.routes, route))
    }

    /// The role's post-login route, or the fallback for unknown roles
    pub fn get_redirect_route(&self, role: &str) -> &str {
        self.entries.get(role).map(|e| e.redirect.as_str()).unwrap_or(self.fallback_route.as_str())
    }

    /// True if the role holds the wildcard or exactly `permission`
    pub fn check_permission(&self, role: &str, permission: &str) -> bool {
        match self.entries.get(role) {
            Some(entry) => {
                entry.has_all_permissions() || entry.permissions.iter().any(|p| p == permission)
            }
            None => false,
        }
    }

    /// All known role codes, sorted
    pub fn get_available_roles(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Entry for a role code
    pub fn get_role_info(&self, role: &str) -> Option<&RolePermissionEntry> {
        self.entries.get(role)
    }

    /// Route used for unknown roles
    pub fn fallback_route(&self) -> &str {
        &self.fallback_route
    }
}

impl PermissionChecker for RoleRegistry {
    fn has_permission(&self, role: &str, permission: &str) -> bool {
        self.check_permission(role, permission)
    }

    fn can_access_route(&self, role: &str, route: &str) -> bool {
        self.check_route_access(role, route)
    }
}
