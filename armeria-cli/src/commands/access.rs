use super::Console;
use anyhow::{bail, Result};
use armeria_core::config::ArmeriaConfig;
use armeria_core::prelude::*;

/// Run the route guard for `route` against the current session
pub async fn open(config: ArmeriaConfig, route: &str) -> Result<()> {
    if !route.starts_with('/') {
        bail!("Route must start with /: {}", route);
    }

    let mut console = Console::connect(config).await?;
    let view = console.layer.guard(RouteGuard::RequireRouteAccess { route: route.to_string() });
    let decision = view.resolve().await;
    console.report_expiry();

    match decision {
        Some(GuardDecision::Admit) => println!("{}: access granted", route),
        Some(GuardDecision::Redirect(to)) => println!("{}: redirect → {}", route, to),
        Some(GuardDecision::Loading) | None => println!("{}: loading", route),
    }
    Ok(())
}

/// List the role table
pub fn roles(config: &ArmeriaConfig) -> Result<()> {
    let registry = config.load_registry()?;

    for code in registry.get_available_roles() {
        let Some(entry) = registry.get_role_info(code) else { continue };
        println!("{} - {}", code, entry.name);
        if !entry.description.is_empty() {
            println!("  {}", entry.description);
        }
        println!("  home:        {}", entry.redirect);
        println!("  routes:      {}", entry.routes.join(", "));
        println!("  permissions: {}", entry.permissions.join(", "));
    }
    println!("fallback: {}", registry.fallback_route());
    Ok(())
}

/// Answer a single role check
pub fn can(
    config: &ArmeriaConfig,
    role: &str,
    route: Option<&str>,
    permission: Option<&str>,
) -> Result<()> {
    let registry = config.load_registry()?;
    let role = role.trim().to_ascii_uppercase();

    let (subject, allowed) = match (route, permission) {
        (Some(route), _) => (route, registry.check_route_access(&role, route)),
        (None, Some(permission)) => (permission, registry.check_permission(&role, permission)),
        (None, None) => bail!("Pass --route or --permission"),
    };

    println!("{} {} {}", role, if allowed { "can" } else { "cannot" }, subject);
    if !allowed {
        std::process::exit(2);
    }
    Ok(())
}
