//! Armeria - Core
//!
//! Session and role access control for the Armeria administration console.
//!
//! # Overview
//!
//! The crate owns everything between the views and the backend that deals
//! with *who* is calling:
//!
//! - [`token`] - the credential (bearer token + active role), persisted
//! - [`gateway`] - authenticated JSON client; a 401 ends the session
//! - [`registry`] - role codes to allowed routes, permissions and landing page
//! - [`session`] - login, logout, restoration and profile updates
//! - [`guard`] - admit, redirect or wait before rendering a protected view
//! - [`app`] - the above wired together from [`config`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use armeria_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ArmeriaConfig::load()?;
//!     init_logging(&config.logging.to_logger_config()?)?;
//!
//!     let layer = AccessLayer::with_config(config).build().await?;
//!     let user = layer
//!         .session()
//!         .login(&LoginCredentials::new("vendedor@armeria.local", "secret"))
//!         .await?;
//!     println!("Welcome {}, go to {}", user.display_name(), layer.session().redirect_route());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config; // Layered configuration with TOML support
pub mod error;
pub mod gateway;
pub mod guard;
pub mod logging; // Structured logging on the standard log crate
pub mod prelude;
pub mod registry;
pub mod session;
pub mod storage; // Durable key-value backends for the credential
pub mod token;

pub use error::{GatewayError, SessionError, StorageError};
