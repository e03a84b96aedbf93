//! Session maintenance commands.

use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Delete sessions whose expiry has passed.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn prune() -> Result<(), CommandError> {
    let pool = connect().await?;
    let store = PostgresStore::new(pool);

    tracing::info!("Deleting expired sessions...");
    store.delete_expired().await?;

    tracing::info!("Expired sessions deleted");
    Ok(())
}
