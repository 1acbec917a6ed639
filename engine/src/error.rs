//! Error types for the Recall engine.

use thiserror::Error;

/// All possible errors from the Recall engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Batch exceeded the hard operation cap. The display text is the exact
    /// message surfaced to clients.
    #[error("Too many operations")]
    TooManyOperations,

    /// Wire discriminator outside the closed set; a client/server version
    /// mismatch.
    #[error("unknown operation type: {0}")]
    UnknownOperationType(String),

    /// The payload did not match the shape its discriminator demands.
    #[error("invalid operation payload: {0}")]
    InvalidPayload(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
