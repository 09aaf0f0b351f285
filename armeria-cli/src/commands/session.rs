use super::Console;
use anyhow::{bail, Result};
use armeria_core::config::ArmeriaConfig;
use armeria_core::prelude::*;

pub async fn login(
    config: ArmeriaConfig,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> Result<()> {
    let console = Console::connect(config).await?;
    let session = console.session();

    let user = session.login(&LoginCredentials::new(email, password)).await?;
    println!("Signed in as {} <{}>", user.display_name(), user.email);

    let landing = match role {
        Some(code) => session.select_role(code).await?,
        None if user.roles.len() > 1 => {
            println!("Roles: {} (choose one with `armeria select-role <CODE>`)", user.role_codes().join(", "));
            session.redirect_route()
        }
        None => session.redirect_route(),
    };
    println!("redirect → {}", landing);
    Ok(())
}

pub async fn logout(config: ArmeriaConfig) -> Result<()> {
    let console = Console::connect(config).await?;
    console.session().logout().await;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(config: ArmeriaConfig, json: bool) -> Result<()> {
    let mut console = Console::connect(config).await?;
    console.report_expiry();

    let Some(user) = console.session().user() else {
        bail!("Not signed in");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!("{} <{}>", user.display_name(), user.email);
    if let Some(id) = &user.id {
        println!("  id:          {}", id);
    }
    if let Some(phone) = &user.phone {
        println!("  phone:       {}", phone);
    }
    for role in &user.roles {
        match &role.name {
            Some(name) => println!("  role:        {} ({})", role.code, name),
            None => println!("  role:        {}", role.code),
        }
    }
    if let Some(active) = console.session().active_role() {
        println!("  acting as:   {}", active);
    }
    println!("  home:        {}", console.session().redirect_route());
    Ok(())
}

pub async fn select_role(config: ArmeriaConfig, code: &str) -> Result<()> {
    let mut console = Console::connect(config).await?;
    console.report_expiry();

    let landing = console.session().select_role(code).await?;
    println!("Acting as {}", code.trim().to_ascii_uppercase());
    println!("redirect → {}", landing);
    Ok(())
}
