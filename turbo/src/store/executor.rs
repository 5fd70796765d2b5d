use deadpool_postgres::{Client, Transaction};
use tokio_postgres::{types::ToSql, Row, Statement};
use tonic::async_trait;

/// Anything that can run prepared statements against the turbos table: a pooled connection
/// or a transaction drawn from one.
///
/// Statements are prepared through the underlying connection's statement cache, so repeated
/// preparation of the same SQL on the same connection is a cache lookup.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Prepare (or fetch the cached preparation of) a statement
    async fn prepare(&self, query: &str) -> Result<Statement, tokio_postgres::Error>;

    /// Run a prepared statement that returns at most one row
    async fn query_opt(
        &self,
        statement: &Statement,
        parameters: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, tokio_postgres::Error>;

    /// Run a prepared statement, returning the number of rows affected
    async fn execute(
        &self,
        statement: &Statement,
        parameters: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, tokio_postgres::Error>;
}

#[async_trait]
impl Executor for Client {
    async fn prepare(&self, query: &str) -> Result<Statement, tokio_postgres::Error> {
        self.prepare_cached(query).await
    }

    async fn query_opt(
        &self,
        statement: &Statement,
        parameters: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, tokio_postgres::Error> {
        let client: &tokio_postgres::Client = self;
        client.query_opt(statement, parameters).await
    }

    async fn execute(
        &self,
        statement: &Statement,
        parameters: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, tokio_postgres::Error> {
        let client: &tokio_postgres::Client = self;
        client.execute(statement, parameters).await
    }
}

#[async_trait]
impl<'a> Executor for Transaction<'a> {
    async fn prepare(&self, query: &str) -> Result<Statement, tokio_postgres::Error> {
        self.prepare_cached(query).await
    }

    async fn query_opt(
        &self,
        statement: &Statement,
        parameters: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, tokio_postgres::Error> {
        let transaction: &tokio_postgres::Transaction<'a> = self;
        transaction.query_opt(statement, parameters).await
    }

    async fn execute(
        &self,
        statement: &Statement,
        parameters: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, tokio_postgres::Error> {
        let transaction: &tokio_postgres::Transaction<'a> = self;
        transaction.execute(statement, parameters).await
    }
}
