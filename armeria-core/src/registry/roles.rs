//! Role permission entries and the built-in role table

use super::matcher::WILDCARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seller handling clients and sales
pub const VENDOR: &str = "VENDOR";
/// Full administrative access
pub const ADMIN: &str = "ADMIN";
/// Payments and invoicing
pub const FINANCE: &str = "FINANCE";
/// Sales team lead
pub const SALES_CHIEF: &str = "SALES_CHIEF";
/// Import groups and licenses
pub const OPERATIONS: &str = "OPERATIONS";

/// Route used when a role is unknown or has no redirect of its own
pub const DEFAULT_FALLBACK_ROUTE: &str = "/dashboard";

/// Static description of what one role may do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionEntry {
    /// Role code, e.g. `VENDOR`
    #[serde(default)]
    pub code: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Allowed route patterns (exact, `prefix/*` or `*`)
    #[serde(default)]
    pub routes: Vec<String>,

    /// Permission strings, or `*` for all
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Where to land after login
    pub redirect: String,
}

impl RolePermissionEntry {
    pub fn new(code: &str, name: &str, description: &str, redirect: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            routes: Vec::new(),
            permissions: Vec::new(),
            redirect: redirect.to_string(),
        }
    }

    pub fn with_routes(mut self, routes: &[&str]) -> Self {
        self.routes.extend(routes.iter().map(|r| r.to_string()));
        self
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions.extend(permissions.iter().map(|p| p.to_string()));
        self
    }

    /// Whether this role holds every permission
    pub fn has_all_permissions(&self) -> bool {
        self.permissions.iter().any(|p| p == WILDCARD)
    }
}

/// The role table shipped with the console
pub fn builtin_roles() -> BTreeMap<String, RolePermissionEntry> {
    let entries = [
        RolePermissionEntry::new(
            ADMIN,
            "Administrador",
            "Full access to every module and to user management",
            "/admin",
        )
        .with_routes(&[WILDCARD])
        .with_permissions(&[WILDCARD]),
        RolePermissionEntry::new(
            VENDOR,
            "Vendedor",
            "Registers clients, browses the weapons catalog and records sales",
            "/vendedor",
        )
        .with_routes(&["/vendedor", "/vendedor/*", "/dashboard", "/perfil"])
        .with_permissions(&[
            "clients:read",
            "clients:write",
            "weapons:read",
            "sales:create",
            "licenses:read",
        ]),
        RolePermissionEntry::new(
            FINANCE,
            "Finanzas",
            "Registers payments and follows up on outstanding balances",
            "/finanzas",
        )
        .with_routes(&["/finanzas", "/finanzas/*", "/dashboard", "/perfil"])
        .with_permissions(&["clients:read", "payments:read", "payments:write", "reports:read"]),
        RolePermissionEntry::new(
            SALES_CHIEF,
            "Jefe de Ventas",
            "Supervises sellers, approves sales and assigns clients to import groups",
            "/jefe-ventas",
        )
        .with_routes(&[
            "/jefe-ventas",
            "/jefe-ventas/*",
            "/vendedor/*",
            "/dashboard",
            "/perfil",
        ])
        .with_permissions(&[
            "clients:read",
            "clients:write",
            "weapons:read",
            "sales:create",
            "sales:approve",
            "groups:read",
            "groups:assign",
            "reports:read",
        ]),
        RolePermissionEntry::new(
            OPERATIONS,
            "Operaciones",
            "Manages import groups, licenses and weapon arrivals",
            "/operaciones",
        )
        .with_routes(&["/operaciones", "/operaciones/*", "/dashboard", "/perfil"])
        .with_permissions(&[
            "groups:read",
            "groups:write",
            "licenses:read",
            "licenses:write",
            "weapons:read",
            "weapons:write",
        ]),
    ];

    entries.into_iter().map(|e| (e.code.clone(), e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roles_are_complete() {
        let roles = builtin_roles();
        for code in [VENDOR, ADMIN, FINANCE, SALES_CHIEF, OPERATIONS] {
            let entry = roles.get(code).unwrap();
            assert_eq!(entry.code, code);
            assert!(entry.redirect.starts_with('/'));
            assert!(!entry.routes.is_empty());
        }
    }

    #[test]
    fn test_only_admin_holds_wildcard() {
        for (code, entry) in builtin_roles() {
            assert_eq!(entry.has_all_permissions(), code == ADMIN);
        }
    }
}
