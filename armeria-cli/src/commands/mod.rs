pub mod access;
pub mod session;

use anyhow::Result;
use armeria_core::config::ArmeriaConfig;
use armeria_core::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A wired layer plus the expiry signals seen while a command ran
pub struct Console {
    pub layer: AccessLayer,
    events: broadcast::Receiver<SessionEvent>,
}

impl Console {
    /// Open the persisted credential and restore the session
    pub async fn connect(config: ArmeriaConfig) -> Result<Self> {
        log::debug!("Connecting to {} ({})", config.api.base_url, config.api.data_source);
        let tokens = Arc::new(config.open_token_store()?);
        let had_credential = tokens.is_authenticated();
        let login_route = config.routes.login.clone();

        let layer = AccessLayer::with_config(config).with_token_store(tokens).build().await?;
        if had_credential && !layer.session().is_authenticated() {
            println!("Session expired, redirect → {}", login_route);
        }

        let events = layer.subscribe();
        Ok(Self { layer, events })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.layer.session()
    }

    /// Print any session-expired signal raised since the last call
    pub fn report_expiry(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Expired { endpoint, redirect_to }) => {
                    println!("Session expired on {}, redirect → {}", endpoint, redirect_to);
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }
}

pub fn show_config(config: &ArmeriaConfig) -> Result<()> {
    config.validate()?;
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
