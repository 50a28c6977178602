//! Latency log summary.

use crate::config::parse_duration;
use clap::Args;
use sink_latency_verify::{LatencyLog, LatencyStats};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Clone, Debug)]
pub struct StatsOpts {
    /// Latency log written by `run`
    #[arg(long, default_value = sink_latency_verify::DEFAULT_LATENCY_LOG)]
    pub latency_log: PathBuf,

    /// Observations above this are counted as timeouts
    #[arg(long, default_value = "3s", value_parser = parse_duration)]
    pub timeout: Duration,
}

/// Read the log and compute statistics. `None` when the log has no entries.
pub fn load_stats(opts: &StatsOpts) -> anyhow::Result<Option<LatencyStats>> {
    let observations = LatencyLog::new(&opts.latency_log).read_observations()?;
    Ok(LatencyStats::from_nanos(&observations, opts.timeout))
}
