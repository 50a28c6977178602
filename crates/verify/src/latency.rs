//! Append-only latency log.
//!
//! One decimal nanosecond count per line. The file is opened in
//! append/create mode for each record and never truncated or rotated.

use crate::error::RecordError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default log file, relative to the working directory.
pub const DEFAULT_LATENCY_LOG: &str = "data.txt";

#[derive(Debug, Clone)]
pub struct LatencyLog {
    path: PathBuf,
}

impl LatencyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `elapsed` and return the nanosecond value written.
    pub fn record(&self, elapsed: Duration) -> Result<i64, RecordError> {
        let nanos = i64::try_from(elapsed.as_nanos()).map_err(|_| RecordError::Overflow(elapsed))?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{nanos}").map_err(|source| self.io_error(source))?;

        debug!("Recorded latency {nanos}ns to {:?}", self.path);
        Ok(nanos)
    }

    /// Read every observation back. Blank lines are skipped.
    pub fn read_observations(&self) -> Result<Vec<i64>, RecordError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                line.trim().parse::<i64>().map_err(|_| RecordError::Parse {
                    path: self.path.clone(),
                    line: index + 1,
                    value: line.to_string(),
                })
            })
            .collect()
    }

    fn io_error(&self, source: std::io::Error) -> RecordError {
        RecordError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
