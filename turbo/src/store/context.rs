//! Request-scoped state for store calls: an optional borrowed transaction and an optional deadline.
//!
//! A `Context` never owns its transaction. Whoever began the transaction keeps it and decides
//! when to commit or roll back, so the same `Context` type works for one-off calls and for
//! calls that are part of a larger unit of work.
use super::Error;
use deadpool_postgres::Transaction;
use std::{future::Future, time::Duration};
use tokio::time::{error::Elapsed, Instant};

/// Request-scoped values threaded through store operations
#[derive(Clone, Copy, Default)]
pub struct Context<'a> {
    transaction: Option<&'a Transaction<'a>>,
    deadline: Option<Instant>,
}

impl<'a> Context<'a> {
    /// Derive a new Context that carries a transaction, keeping this Context's deadline
    pub fn with_transaction<'b>(&self, transaction: &'b Transaction<'b>) -> Context<'b> {
        Context {
            transaction: Some(transaction),
            deadline: self.deadline,
        }
    }

    /// Derive a new Context that expires at a fixed point in time
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..*self
        }
    }

    /// Derive a new Context that expires after some duration from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Get the transaction attached to this Context
    pub fn transaction(&self) -> Result<&'a Transaction<'a>, Error> {
        self.transaction.ok_or(Error::NoTransaction)
    }

    /// The point in time after which operations in this Context are abandoned
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive a future to completion, giving up once this Context's deadline passes
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Elapsed>
    where
        F: Future,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, future).await,
            None => Ok(future.await),
        }
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Context")
            .field("transaction", &self.transaction.is_some())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::Context;
    use crate::store::Kind;
    use std::time::Duration;

    #[test]
    fn fails_without_a_transaction() {
        let error = Context::default()
            .transaction()
            .expect_err("Found a transaction in an empty Context");

        assert_eq!(error.kind(), Kind::NoTransactionInContext);
    }

    #[tokio::test]
    async fn runs_without_a_deadline() {
        let context = Context::default();

        assert!(context.deadline().is_none());
        assert_eq!(context.run(async { 42 }).await, Ok(42));
    }

    #[tokio::test]
    async fn abandons_futures_past_the_deadline() {
        let context = Context::default().with_timeout(Duration::from_millis(10));

        let result = context
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;

        assert!(result.is_err(), "Future outlived its deadline");
    }

    #[test]
    fn derived_contexts_leave_the_original_untouched() {
        let original = Context::default();
        let derived = original.with_timeout(Duration::from_secs(1));

        assert!(original.deadline().is_none());
        assert!(derived.deadline().is_some());
    }
}
