use crate::store::Store;
use std::time::Duration;

/// Health reporting driven by database reachability
#[cfg(feature = "health")]
pub mod health;

/// Turbo service that exposes CRUD operations and a database-aware ping
pub mod turbo;

/// Upper bound on each database reachability check
const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Check whether the database answers within the ping timeout
async fn database_is_up(store: &Store) -> bool {
    match tokio::time::timeout(PING_TIMEOUT, store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            tracing::warn!(%error, "Database ping failed");
            false
        }
        Err(_) => {
            tracing::warn!(timeout = ?PING_TIMEOUT, "Database ping timed out");
            false
        }
    }
}
