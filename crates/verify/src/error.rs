//! Error types for verification and latency recording.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while probing the destination store.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Could not connect to PostgreSQL.
    #[error("PostgreSQL connection error: {0}")]
    Connection(#[source] tokio_postgres::Error),

    /// The lookup itself failed (as opposed to returning no row).
    #[error("Query error: {0}")]
    Query(String),

    /// A table or column name that cannot be used unquoted.
    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl From<tokio_postgres::Error> for VerifyError {
    fn from(err: tokio_postgres::Error) -> Self {
        VerifyError::Query(err.to_string())
    }
}

/// Errors that can occur while appending to or reading the latency log.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Latency log I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Latency {0:?} does not fit in a signed 64-bit nanosecond count")]
    Overflow(Duration),

    #[error("Invalid latency value {value:?} at {path:?} line {line}")]
    Parse {
        path: PathBuf,
        line: usize,
        value: String,
    },
}
