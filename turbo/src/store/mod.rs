//! Data access for the turbos table.
//!
//! Every operation has a plain variant that draws a connection from the pool and a `*_tx`
//! variant that runs inside the transaction attached to its [`Context`]. Both share a single
//! implementation generic over [`Executor`], which is also public for callers that would rather
//! pass a connection or transaction explicitly.
//!
//! ```ignore
//! let mut client = store.connection().await?;
//! let transaction = client.transaction().await?;
//! let context = Context::default().with_transaction(&transaction);
//!
//! store.create_tx(&context, &turbo).await?;
//! store.get_tx(&context, turbo.id).await?;
//!
//! transaction.commit().await?;
//! ```
pub use configuration::{Configuration, Error as ConfigurationError};
pub use context::Context;
pub use error::{Error, Kind, Operation};
pub use executor::Executor;
pub use statements::{Statements, TURBOS};
pub use turbo::{parse_id, ProtoTurbo, Turbo};
use deadpool_postgres::{Client, Pool};
use std::time::Duration;

mod configuration;
mod context;
mod error;
mod executor;
mod statements;

/// Turbo entity, wire conversions, and CRUD operations
pub mod turbo;

/// Shared handle to the turbos table, safe for concurrent use across requests
pub struct Store {
    pool: Pool,
    statement_timeout: Option<Duration>,
}

impl Store {
    /// Create a new store from a `deadpool_postgres` pool
    pub fn new(pool: Pool, statement_timeout: Option<Duration>) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Draw a connection from the pool for direct use or for beginning a transaction
    pub async fn connection(&self) -> Result<Client, Error> {
        let client = self.pool.get().await?;

        // set the statement_timeout for the session
        if let Some(statement_timeout) = self.statement_timeout {
            client
                .batch_execute(&format!(
                    "SET statement_timeout={}",
                    statement_timeout.as_millis()
                ))
                .await?;
        }

        Ok(client)
    }

    /// Check that the database is reachable with a trivial query
    #[tracing::instrument(skip(self), err)]
    pub async fn ping(&self) -> Result<(), Error> {
        let client = self.connection().await?;

        client.simple_query("SELECT 1").await?;

        Ok(())
    }

    /// Build a store whose pool has never connected, for tests that never reach the database
    #[cfg(test)]
    pub(crate) fn lazy() -> Self {
        // nothing listens on port 1, so connections are refused immediately
        Self::lazy_at(1)
    }

    /// Build an unconnected store pointing at a local port
    #[cfg(test)]
    pub(crate) fn lazy_at(port: u16) -> Self {
        let pool = deadpool_postgres::Config {
            dbname: Some("turbos".into()),
            host: Some("127.0.0.1".into()),
            port: Some(port),
            user: Some("postgres".into()),
            ..deadpool_postgres::Config::default()
        }
        .create_pool(None, tokio_postgres::NoTls)
        .expect("Failed to build an unconnected pool");

        Self::new(pool, None)
    }
}
