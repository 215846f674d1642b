use std::time::Duration;

/// Core error type for startup and wiring failures.
///
/// Adapter crates map their specific errors into this type so `main` can report
/// them consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),

    /// The messenger refused the message body itself (e.g. malformed markup).
    #[error("message rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single model query.
///
/// These never reach the user as an error value: the query client renders them
/// into the fixed-format reply text.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("http error: {0}")]
    Http(String),

    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("request blocked: {0}")]
    Blocked(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("worker task failed: {0}")]
    Worker(String),
}
