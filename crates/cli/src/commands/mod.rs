//! Command implementations.

pub mod config;
pub mod migrate;
pub mod sessions;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors a command can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] lumen_storefront::config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    SessionStore(#[from] tower_sessions::session_store::Error),
}

/// Connect to the session database named by the storefront configuration.
///
/// Only the database URL is read, so the API settings need not be present.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let url: SecretString = lumen_storefront::config::database_url_from_env()?;

    tracing::info!("Connecting to session database...");
    Ok(lumen_storefront::db::create_pool(&url).await?)
}
