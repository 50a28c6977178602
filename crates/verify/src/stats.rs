//! Summary statistics over a latency log.

use std::fmt;
use std::time::Duration;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Statistics over observations that finished within the timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub stdev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    /// Values outside `[q1 - 1.5 * iqr, q3 + 1.5 * iqr]`, in log order.
    pub outliers_ms: Vec<f64>,
}

/// Statistics for a whole latency log.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    /// Every observation, including timeouts.
    pub count: usize,
    /// Observations above the timeout.
    pub timeouts: usize,
    /// `None` when every observation timed out.
    pub summary: Option<LatencySummary>,
}

impl LatencyStats {
    /// Compute statistics from nanosecond observations. `None` for an empty log.
    pub fn from_nanos(observations: &[i64], timeout: Duration) -> Option<Self> {
        if observations.is_empty() {
            return None;
        }

        let timeout_ms = timeout.as_secs_f64() * 1000.0;
        let within: Vec<f64> = observations
            .iter()
            .map(|&nanos| nanos as f64 / NANOS_PER_MILLI)
            .filter(|&ms| ms <= timeout_ms)
            .collect();

        Some(Self {
            count: observations.len(),
            timeouts: observations.len() - within.len(),
            summary: summarize(&within),
        })
    }
}

fn summarize(values: &[f64]) -> Option<LatencySummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let stdev = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    Some(LatencySummary {
        mean_ms: mean,
        median_ms: percentile(&sorted, 50.0),
        stdev_ms: stdev,
        min_ms: sorted[0],
        max_ms: sorted[sorted.len() - 1],
        outliers_ms: values
            .iter()
            .copied()
            .filter(|&v| v < lower || v > upper)
            .collect(),
    })
}

/// Linear-interpolated percentile of a sorted, non-empty slice.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

impl fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Count     : {}", self.count)?;
        if let Some(s) = &self.summary {
            let outliers = s
                .outliers_ms
                .iter()
                .map(|v| format!("{v:.5}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "Mean      : {:.5} ms", s.mean_ms)?;
            writeln!(f, "Median    : {:.5} ms", s.median_ms)?;
            writeln!(f, "Stdev     : {:.5} ms", s.stdev_ms)?;
            writeln!(f, "Min       : {:.5} ms", s.min_ms)?;
            writeln!(f, "Max       : {:.5} ms", s.max_ms)?;
            writeln!(f, "Outliers  : [{outliers}] ms")?;
        }
        write!(f, "Timeouts  : {}", self.timeouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1_000_000;

    #[test]
    fn test_empty_log_has_no_stats() {
        assert!(LatencyStats::from_nanos(&[], Duration::from_secs(3)).is_none());
    }

    #[test]
    fn test_basic_summary() {
        let data = [10 * MS, 20 * MS, 30 * MS, 40 * MS];
        let stats = LatencyStats::from_nanos(&data, Duration::from_secs(3)).unwrap();
        let s = stats.summary.unwrap();

        assert_eq!(stats.count, 4);
        assert_eq!(stats.timeouts, 0);
        assert_eq!(s.mean_ms, 25.0);
        assert_eq!(s.median_ms, 25.0);
        assert_eq!(s.min_ms, 10.0);
        assert_eq!(s.max_ms, 40.0);
        assert!((s.stdev_ms - 12.909944487358056).abs() < 1e-9);
        assert!(s.outliers_ms.is_empty());
    }

    #[test]
    fn test_timeouts_counted_but_excluded() {
        let data = [100 * MS, 3000 * MS, 3001 * MS, 5000 * MS];
        let stats = LatencyStats::from_nanos(&data, Duration::from_secs(3)).unwrap();

        assert_eq!(stats.count, 4);
        assert_eq!(stats.timeouts, 2);
        let s = stats.summary.unwrap();
        assert_eq!(s.max_ms, 3000.0);
        assert_eq!(s.min_ms, 100.0);
    }

    #[test]
    fn test_all_timeouts_leave_no_summary() {
        let data = [4000 * MS, 5000 * MS];
        let stats = LatencyStats::from_nanos(&data, Duration::from_secs(3)).unwrap();

        assert_eq!(stats.timeouts, 2);
        assert!(stats.summary.is_none());
        assert_eq!(stats.to_string(), "Count     : 2\nTimeouts  : 2");
    }

    #[test]
    fn test_single_observation_has_zero_stdev() {
        let stats = LatencyStats::from_nanos(&[42 * MS], Duration::from_secs(3)).unwrap();
        assert_eq!(stats.summary.unwrap().stdev_ms, 0.0);
    }

    #[test]
    fn test_iqr_outliers() {
        let data = [10 * MS, 11 * MS, 12 * MS, 13 * MS, 14 * MS, 500 * MS];
        let stats = LatencyStats::from_nanos(&data, Duration::from_secs(3)).unwrap();

        assert_eq!(stats.summary.unwrap().outliers_ms, vec![500.0]);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 25.0), 1.75);
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert_eq!(percentile(&sorted, 75.0), 3.25);
        assert_eq!(percentile(&[7.0], 90.0), 7.0);
    }
}
