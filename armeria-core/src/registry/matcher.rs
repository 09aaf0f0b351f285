//! Route pattern matching
//!
//! Patterns are either exact paths (`/perfil`), prefix wildcards
//! (`/vendedor/*`), or the catch-all `*`. A wildcard pattern matches every
//! route that starts with the text before the `*`.

/// Wildcard marker for route patterns and permission sets
pub const WILDCARD: &str = "*";

/// Route pattern matcher
pub struct RouteMatcher;

impl RouteMatcher {
    /// Match a route against a single pattern
    pub fn matches(pattern: &str, route: &str) -> bool {
        if pattern == route {
            return true;
        }

        match pattern.strip_suffix(WILDCARD) {
            Some(prefix) => route.starts_with(prefix),
            None => false,
        }
    }

    /// Match a route against any of the given patterns
    pub fn matches_any<'a>(patterns: impl IntoIterator<Item = &'a String>, route: &str) -> bool {
        patterns.into_iter().any(|p| Self::matches(p, route))
    }
}
