//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `LUMEN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Create the session schema and table used by the storefront.
///
/// Safe to run repeatedly; existing tables are left alone.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn sessions() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session migrations complete!");
    Ok(())
}
