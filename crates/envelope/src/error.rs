//! Error types for sink-latency-envelope crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("JSON encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("JSON decoding error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Field '{0}' is not declared in the schema")]
    MissingField(String),
}

/// Result type alias for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
