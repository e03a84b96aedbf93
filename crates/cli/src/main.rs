//! Lumen CLI - session store and configuration tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! lumen-cli migrate sessions
//!
//! # Delete expired sessions
//! lumen-cli sessions prune
//!
//! # Validate the storefront environment without starting it
//! lumen-cli config check
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lumen-cli")]
#[command(author, version, about = "Lumen Beauty storefront tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Maintain stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the `tower_sessions` schema and table
    Sessions,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Delete sessions past their expiry
    Prune,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load the storefront configuration and report problems
    Check,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Sessions { action } => match action {
            SessionAction::Prune => commands::sessions::prune().await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Check => commands::config::check()?,
        },
    }
    Ok(())
}
