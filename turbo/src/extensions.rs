//! Derivation of request-scoped store values from incoming [`tonic::Request`]s.
use crate::store::Context;
use std::time::Duration;
use tokio::time::Instant;
use tonic::{Request, Status};

/// Header set by gRPC clients to bound the lifetime of a call
const TIMEOUT_HEADER: &str = "grpc-timeout";

/// gRPC caps timeout values at 8 digits
const MAX_TIMEOUT_DIGITS: usize = 8;

/// Helper trait to encapsulate logic for deriving values from [`tonic::Request`]s.
pub trait FromRequest
where
    Self: Sized,
{
    /// Errors associated with deriving a value from a gRPC request.
    type Error: std::error::Error + Into<Status>;

    /// Derive a value from a [`tonic::Request`].
    fn from_request<T>(request: &Request<T>) -> Result<Self, Self::Error>;
}

/// Store Contexts inherit the caller's deadline, if any
impl FromRequest for Context<'static> {
    type Error = Status;

    fn from_request<T>(request: &Request<T>) -> Result<Self, Self::Error> {
        let timeout = request
            .metadata()
            .get(TIMEOUT_HEADER)
            .map(|header| {
                header
                    .to_str()
                    .ok()
                    .and_then(parse_timeout)
                    .ok_or_else(|| {
                        Status::invalid_argument(format!("Invalid {} header", TIMEOUT_HEADER))
                    })
            })
            .transpose()?;

        let context = match timeout {
            Some(timeout) => Context::default().with_deadline(Instant::now() + timeout),
            None => Context::default(),
        };

        Ok(context)
    }
}

/// Parse a gRPC timeout value of the form `<digits><unit>`
fn parse_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || !value.is_ascii() {
        return None;
    }

    let (digits, unit) = value.split_at(value.len() - 1);

    if digits.len() > MAX_TIMEOUT_DIGITS || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let amount: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };

    Some(duration)
}
