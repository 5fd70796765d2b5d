use std::fmt;
use thiserror::Error;
use tonic::Status;

/// Data-access operations over the turbos table, used to label wrapped errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// INSERT of a new turbo
    Create,
    /// SELECT of a single live turbo
    Get,
    /// UPDATE of a live turbo's name
    Update,
    /// soft-delete of a live turbo
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
        };

        formatter.write_str(operation)
    }
}

/// Stable classification of store errors for programmatic matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The requested live row does not exist (absent or soft-deleted)
    NotFound,
    /// An insert reported zero affected rows
    NotCreated,
    /// An update reported zero affected rows
    NoRowsAffected,
    /// A transactional variant was called without a transaction in its Context
    NoTransactionInContext,
    /// An identifier string could not be parsed as a UUID
    MalformedIdentifier,
    /// The Context deadline elapsed before the database answered
    Timeout,
    /// No connection could be drawn from the pool
    Pool,
    /// Any other database-level failure
    Query,
}

/// Errors related to reading and writing turbos
#[derive(Debug, Error)]
pub enum Error {
    /// Requested live row does not exist
    #[error("turbo not found")]
    NotFound,
    /// Insert reported zero affected rows, usually because the ID is already taken
    #[error("turbo not created")]
    NotCreated,
    /// Update reported zero affected rows
    #[error("no rows affected")]
    NoRowsAffected,
    /// Transactional variant invoked without a transaction attached to the Context
    #[error("No transaction present in context")]
    NoTransaction,
    /// Identifier string failed to parse
    #[error("Invalid turbo ID '{id}': {source}")]
    MalformedIdentifier {
        /// the raw identifier from the request
        id: String,
        /// the underlying parse failure
        source: uuid::Error,
    },
    /// The Context deadline elapsed first
    #[error("Deadline elapsed before the database responded")]
    Timeout,
    /// Bubbled-up `deadpool_postgres` connection pool errors
    #[error("Error fetching connection from the pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    /// Bubbled-up `tokio_postgres` SQL-level errors within a connection
    #[error("SQL Query error: {0}")]
    Query(#[from] tokio_postgres::Error),
    /// Any of the above, labelled with the operation and its key argument
    #[error("Error executing {operation} turbo - {subject}: {source}")]
    Operation {
        /// the failed operation
        operation: Operation,
        /// the turbo or turbo ID the operation was called with
        subject: String,
        /// the underlying cause
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the operation that produced it and that operation's key argument
    pub fn wrap(self, operation: Operation, subject: impl fmt::Display) -> Self {
        Self::Operation {
            operation,
            subject: subject.to_string(),
            source: Box::new(self),
        }
    }

    /// Classify this error, looking through any operation wrappers
    pub fn kind(&self) -> Kind {
        match self {
            Self::NotFound => Kind::NotFound,
            Self::NotCreated => Kind::NotCreated,
            Self::NoRowsAffected => Kind::NoRowsAffected,
            Self::NoTransaction => Kind::NoTransactionInContext,
            Self::MalformedIdentifier { .. } => Kind::MalformedIdentifier,
            Self::Timeout => Kind::Timeout,
            Self::Pool(..) => Kind::Pool,
            Self::Query(..) => Kind::Query,
            Self::Operation { source, .. } => source.kind(),
        }
    }
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        let message = error.to_string();

        match error.kind() {
            Kind::NotFound | Kind::NoRowsAffected => Status::not_found(message),
            Kind::NotCreated => Status::already_exists(message),
            Kind::MalformedIdentifier => Status::invalid_argument(message),
            Kind::Timeout => Status::deadline_exceeded(message),
            Kind::Pool => Status::unavailable(message),
            Kind::NoTransactionInContext | Kind::Query => Status::internal(message),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Error, Kind, Operation};
    use std::error::Error as _;
    use tonic::{Code, Status};

    const TURBO_ID: &str = "72bc87f3-4a9f-4d05-93fe-844d3cd94c65";

    #[test]
    fn wrapping_keeps_the_kind_and_cause() {
        let error = Error::NoRowsAffected.wrap(Operation::Update, TURBO_ID);

        assert_eq!(error.kind(), Kind::NoRowsAffected);
        assert_eq!(
            error.to_string(),
            format!("Error executing update turbo - {TURBO_ID}: no rows affected")
        );

        let cause = error.source().expect("Wrapped error lost its cause");
        assert_eq!(cause.to_string(), "no rows affected");
    }

    #[test]
    fn maps_kinds_to_status_codes() {
        let cases = [
            (Error::NotFound.wrap(Operation::Get, TURBO_ID), Code::NotFound),
            (Error::NoRowsAffected, Code::NotFound),
            (Error::NotCreated, Code::AlreadyExists),
            (Error::NoTransaction, Code::Internal),
            (Error::Timeout.wrap(Operation::Delete, TURBO_ID), Code::DeadlineExceeded),
        ];

        for (error, code) in cases {
            let message = error.to_string();
            let status = Status::from(error);

            assert_eq!(status.code(), code);
            assert_eq!(status.message(), message);
        }
    }

    #[test]
    fn malformed_identifiers_are_invalid_arguments() {
        let source = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
        let error = Error::MalformedIdentifier {
            id: "not-a-uuid".into(),
            source,
        };

        assert_eq!(error.kind(), Kind::MalformedIdentifier);
        assert_eq!(Status::from(error).code(), Code::InvalidArgument);
    }
}
