//! Wired access-control layer
//!
//! [`AccessLayer`] is the context object a host passes around: one token
//! store, one gateway reading from it, one session manager following the
//! gateway's expiry signal, and the role table. There are no globals; two
//! layers built from different configs are fully independent.
//!
//! ```rust,ignore
//! let layer = AccessLayer::builder().with_data_source(DataSource::Mock).build().await?;
//! layer.session().login(&LoginCredentials::new("admin@armeria.local", "armeria123")).await?;
//! let view = layer.guard(RouteGuard::RequireAuth);
//! ```

mod builder;

pub use builder::AccessLayerBuilder;

use crate::config::ArmeriaConfig;
use crate::gateway::{Gateway, SessionEvent};
use crate::guard::{GuardedView, RouteGuard};
use crate::registry::RoleRegistry;
use crate::session::SessionManager;
use crate::token::TokenStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Token store, gateway, registry and session manager wired together
pub struct AccessLayer {
    config: ArmeriaConfig,
    tokens: Arc<TokenStore>,
    gateway: Gateway,
    registry: Arc<RoleRegistry>,
    session: Arc<SessionManager>,
    follower: JoinHandle<()>,
}

impl AccessLayer {
    pub fn builder() -> AccessLayerBuilder {
        AccessLayerBuilder::new()
    }

    pub fn with_config(config: ArmeriaConfig) -> AccessLayerBuilder {
        AccessLayerBuilder::with_config(config)
    }

    pub fn config(&self) -> &ArmeriaConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Gateway for domain calls
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Session-expired signals, for navigating to the login route
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.gateway.subscribe()
    }

    /// Mount a guarded view using the configured routes
    pub fn guard(&self, guard: RouteGuard) -> GuardedView {
        GuardedView::new(guard, self.session.clone(), self.config.routes.clone())
    }
}

impl Drop for AccessLayer {
    fn drop(&mut self) {
        self.follower.abort();
    }
}
