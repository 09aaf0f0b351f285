//! Armeria CLI - terminal host for the console's access-control layer.
//!
//! ```bash
//! armeria login --email vendedor@armeria.local --password ...
//! armeria whoami
//! armeria open /vendedor/clientes
//! armeria logout
//! ```
//!
//! The credential persists in `storage.path` between invocations. See
//! `armeria --help` for all available commands and options.

mod commands;

use armeria_core::config::ArmeriaConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "armeria", about = "Armeria console session and access control", version)]
struct Cli {
    /// Config file (defaults to ./armeria.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the credential
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ARMERIA_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role to act as, for users holding several
        #[arg(long)]
        role: Option<String>,
    },

    /// End the session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Print the user as JSON
        #[arg(long)]
        json: bool,
    },

    /// Act as one of your roles
    SelectRole {
        /// Role code, e.g. FINANCE
        code: String,
    },

    /// Check whether the current session may open a route
    Open {
        /// Route path, e.g. /finanzas/pagos
        route: String,
    },

    /// List the role table
    Roles,

    /// Check a role against a route or a permission
    Can {
        role: String,

        #[arg(long, conflicts_with = "permission", required_unless_present = "permission")]
        route: Option<String>,

        #[arg(long)]
        permission: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ArmeriaConfig> {
    match path {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
            ArmeriaConfig::load_from(path)
        }
        None => ArmeriaConfig::load(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config)?;
    armeria_core::logging::init_logging(&config.logging.to_logger_config()?)?;

    match cli.command {
        Commands::Login { email, password, role } => {
            commands::session::login(config, &email, &password, role.as_deref()).await
        }
        Commands::Logout => commands::session::logout(config).await,
        Commands::Whoami { json } => commands::session::whoami(config, json).await,
        Commands::SelectRole { code } => commands::session::select_role(config, &code).await,
        Commands::Open { route } => commands::access::open(config, &route).await,
        Commands::Roles => commands::access::roles(&config),
        Commands::Can { role, route, permission } => {
            commands::access::can(&config, &role, route.as_deref(), permission.as_deref())
        }
        Commands::Config => commands::show_config(&config),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
