//! Our error types for the CPX400 remote interface.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error type for CPX400 communications.
#[derive(Error, Debug)]
pub enum Error {
    /// Builder was finalized without a transport.
    #[error("no transport supplied")]
    NoTransport,
    /// Monitor was spawned with nothing to poll.
    #[error("no sections to monitor")]
    NoSections,
    #[error("failed to open connection: {0}")]
    Connect(#[source] std::io::Error),
    /// A write or read failed mid-transaction. Fatal to the batch.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Reply token count did not match the command's expected shape.
    #[error("unexpected reply length")]
    UnexpectedReplyLength,
    /// The output state token was not a recognisable boolean.
    #[error("invalid state token: {0:?}")]
    InvalidState(String),
}
