//! Deadline-bounded polling until a row appears.

use crate::error::VerifyError;
use crate::probe::{ProbeOutcome, RowProbe};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Deadline used by the reference latency test.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3);

/// What to do when a probe fails instead of answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryErrorPolicy {
    /// Count the failure and keep polling until the deadline.
    #[default]
    Continue,
    /// Stop and return the error.
    Abort,
}

/// Outcome of one polling window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub found: bool,
    /// Time from the start of polling to the successful probe, or to the
    /// moment the deadline was observed as passed.
    pub elapsed: Duration,
    pub attempts: u64,
    pub query_failures: u64,
    pub last_error: Option<String>,
}

/// Polls a [`RowProbe`] in a tight loop until it finds a row or the deadline passes.
#[derive(Debug, Clone)]
pub struct VerificationPoller {
    deadline: Duration,
    on_query_error: QueryErrorPolicy,
}

impl Default for VerificationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}

impl VerificationPoller {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            on_query_error: QueryErrorPolicy::default(),
        }
    }

    pub fn with_query_error_policy(mut self, policy: QueryErrorPolicy) -> Self {
        self.on_query_error = policy;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Probe until a row is found or `elapsed > deadline`.
    ///
    /// The deadline is checked before every attempt, so the probe is never
    /// called once it has passed. An attempt that started in time and finds
    /// the row counts as found. Returns `Err` only under
    /// [`QueryErrorPolicy::Abort`].
    pub async fn poll_until_found<P>(&self, probe: &mut P) -> Result<PollReport, VerifyError>
    where
        P: RowProbe + ?Sized,
    {
        let start = Instant::now();
        let mut report = PollReport {
            found: false,
            elapsed: Duration::ZERO,
            attempts: 0,
            query_failures: 0,
            last_error: None,
        };

        loop {
            let elapsed = start.elapsed();
            if elapsed > self.deadline {
                report.elapsed = elapsed;
                info!(
                    "Row not found within {:?} after {} attempts ({} failed)",
                    self.deadline, report.attempts, report.query_failures
                );
                return Ok(report);
            }

            report.attempts += 1;
            match probe.probe().await {
                Ok(ProbeOutcome::Found) => {
                    report.found = true;
                    report.elapsed = start.elapsed();
                    info!(
                        "Row found after {:?} ({} attempts)",
                        report.elapsed, report.attempts
                    );
                    return Ok(report);
                }
                Ok(ProbeOutcome::NotFound) => {
                    debug!("Attempt {}: no matching row", report.attempts);
                }
                Err(e) => match self.on_query_error {
                    QueryErrorPolicy::Abort => return Err(e),
                    QueryErrorPolicy::Continue => {
                        warn!("Attempt {} failed: {}", report.attempts, e);
                        report.query_failures += 1;
                        report.last_error = Some(e.to_string());
                    }
                },
            }

            // Lets the runtime make progress when the probe never suspends.
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Replays scripted answers, then repeats `fallback` forever.
    struct ScriptedProbe {
        script: VecDeque<Result<ProbeOutcome, VerifyError>>,
        fallback: ProbeOutcome,
        delay: Duration,
        calls: Vec<Instant>,
    }

    impl ScriptedProbe {
        fn new(script: Vec<Result<ProbeOutcome, VerifyError>>, fallback: ProbeOutcome) -> Self {
            Self {
                script: script.into(),
                fallback,
                delay: Duration::ZERO,
                calls: Vec::new(),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl RowProbe for ScriptedProbe {
        async fn probe(&mut self) -> Result<ProbeOutcome, VerifyError> {
            self.calls.push(Instant::now());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.script.pop_front().unwrap_or(Ok(self.fallback))
        }
    }

    /// Fails every call.
    struct BrokenProbe {
        calls: u64,
    }

    #[async_trait]
    impl RowProbe for BrokenProbe {
        async fn probe(&mut self) -> Result<ProbeOutcome, VerifyError> {
            self.calls += 1;
            Err(VerifyError::Query("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_found_on_third_attempt() {
        let mut probe = ScriptedProbe::new(
            vec![Ok(ProbeOutcome::NotFound), Ok(ProbeOutcome::NotFound)],
            ProbeOutcome::Found,
        );
        let report = VerificationPoller::new(Duration::from_secs(3))
            .poll_until_found(&mut probe)
            .await
            .unwrap();

        assert!(report.found);
        assert_eq!(report.attempts, 3);
        assert_eq!(probe.calls.len(), 3);
        assert_eq!(report.query_failures, 0);
        assert!(report.elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_measured_from_poll_start() {
        let mut probe = ScriptedProbe::new(
            vec![
                Ok(ProbeOutcome::NotFound),
                Ok(ProbeOutcome::NotFound),
                Ok(ProbeOutcome::NotFound),
            ],
            ProbeOutcome::Found,
        )
        .with_delay(Duration::from_millis(25));

        let report = VerificationPoller::new(Duration::from_secs(3))
            .poll_until_found(&mut probe)
            .await
            .unwrap();

        assert!(report.found);
        assert_eq!(report.attempts, 4);
        assert!(report.elapsed >= Duration::from_millis(100));
        assert!(report.elapsed < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_stops_at_deadline() {
        let deadline = Duration::from_millis(100);
        let mut probe = ScriptedProbe::new(vec![], ProbeOutcome::NotFound)
            .with_delay(Duration::from_millis(10));

        let report = VerificationPoller::new(deadline)
            .poll_until_found(&mut probe)
            .await
            .unwrap();

        assert!(!report.found);
        assert!(report.elapsed > deadline);
        assert!(report.elapsed <= deadline + Duration::from_millis(10));
        assert_eq!(report.attempts, probe.calls.len() as u64);
        assert_eq!(report.attempts, 11);

        // No call starts after the deadline has passed.
        let first = probe.calls[0];
        for call in &probe.calls {
            assert!(call.duration_since(first) <= deadline);
        }
    }

    #[tokio::test]
    async fn test_not_found_real_clock_returns_near_deadline() {
        let deadline = Duration::from_millis(50);
        let mut probe = ScriptedProbe::new(vec![], ProbeOutcome::NotFound);

        let report = VerificationPoller::new(deadline)
            .poll_until_found(&mut probe)
            .await
            .unwrap();

        assert!(!report.found);
        assert!(report.elapsed > deadline);
        assert!(report.elapsed < Duration::from_secs(1));
        assert!(report.attempts > 1);
    }

    #[tokio::test]
    async fn test_query_errors_absorbed_by_default() {
        let mut probe = ScriptedProbe::new(
            vec![
                Err(VerifyError::Query("relation does not exist".to_string())),
                Err(VerifyError::Query("relation does not exist".to_string())),
            ],
            ProbeOutcome::Found,
        );

        let report = VerificationPoller::new(Duration::from_secs(3))
            .poll_until_found(&mut probe)
            .await
            .unwrap();

        assert!(report.found);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.query_failures, 2);
        assert_eq!(
            report.last_error.as_deref(),
            Some("Query error: relation does not exist")
        );
    }

    #[tokio::test]
    async fn test_persistent_failures_reported_at_deadline() {
        let mut probe = BrokenProbe { calls: 0 };

        let report = VerificationPoller::new(Duration::from_millis(20))
            .poll_until_found(&mut probe)
            .await
            .unwrap();

        assert!(!report.found);
        assert_eq!(report.query_failures, report.attempts);
        assert_eq!(probe.calls, report.attempts);
        assert!(report.last_error.is_some());
    }

    #[tokio::test]
    async fn test_abort_policy_returns_first_error() {
        let mut probe = BrokenProbe { calls: 0 };

        let result = VerificationPoller::new(Duration::from_secs(3))
            .with_query_error_policy(QueryErrorPolicy::Abort)
            .poll_until_found(&mut probe)
            .await;

        assert!(matches!(result, Err(VerifyError::Query(_))));
        assert_eq!(probe.calls, 1);
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let mut probe: Box<dyn RowProbe> =
            Box::new(ScriptedProbe::new(vec![], ProbeOutcome::Found));

        let report = VerificationPoller::default()
            .poll_until_found(probe.as_mut())
            .await
            .unwrap();

        assert!(report.found);
        assert_eq!(report.attempts, 1);
    }
}
