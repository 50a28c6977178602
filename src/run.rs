//! The produce-and-verify latency test.
//!
//! ```text
//! connect probe ─► open txn ─► publish key/value ─► commit ─► poll table ─► record latency ─► close
//! ```
//!
//! Polling starts only after the commit returns, so the recorded latency
//! covers broker → connector → PostgreSQL.

use crate::config::{parse_duration, PipelineConfig};
use anyhow::Context;
use clap::Args;
use sink_latency_envelope::Envelope;
use sink_latency_txn_producer::{ProducerSettings, TransactionalPublisher};
use sink_latency_verify::{
    LatencyLog, PollReport, PostgresProbe, ProbeQuery, QueryErrorPolicy, RowProbe,
    VerificationPoller,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Args, Clone, Debug)]
pub struct RunOpts {
    /// Topic to publish the probe message to
    #[arg(long, default_value = "test_topic")]
    pub topic: String,

    /// Transactional ID for the producer (reuse across sequential runs)
    #[arg(long, env = "KAFKA_TRANSACTION_ID", default_value = "test_transaction")]
    pub transaction_id: String,

    /// Identifier value placed in the message key
    #[arg(long, default_value = "random_id")]
    pub key_id: String,

    /// Name of the value field
    #[arg(long, default_value = "value")]
    pub value_field: String,

    /// Value placed in the message value
    #[arg(long, default_value = "random_value")]
    pub value: String,

    /// How long to wait for the row (e.g. "3s", "500ms")
    #[arg(long, default_value = "3s", value_parser = parse_duration)]
    pub deadline: Duration,

    /// File the measured latency is appended to
    #[arg(long, default_value = sink_latency_verify::DEFAULT_LATENCY_LOG)]
    pub latency_log: PathBuf,

    /// Only count a row whose identifier equals --key-id
    #[arg(long)]
    pub match_key: bool,

    /// Stop polling on the first failed query instead of retrying until the deadline
    #[arg(long)]
    pub abort_on_query_error: bool,
}

/// What one run observed.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: PollReport,
    /// Value appended to the latency log.
    pub recorded_nanos: i64,
}

/// Publish one record in a transaction and time its arrival in `<topic>_table`.
///
/// Blocking producer calls run under `block_in_place`, so this must be
/// driven by a multi-threaded runtime.
pub async fn run_latency_test(
    config: &PipelineConfig,
    opts: &RunOpts,
) -> anyhow::Result<RunOutcome> {
    let mut query = ProbeQuery::for_topic(&opts.topic, &config.id_field);
    if opts.match_key {
        query = query.matching_key(&opts.key_id);
    }
    let mut probe = PostgresProbe::connect(&config.postgres.connection_string(), query)
        .await
        .context("Failed to connect verification probe")?;

    let key = Envelope::single_string(&config.id_field, &opts.key_id)
        .to_vec()
        .context("Failed to encode message key")?;
    let value = Envelope::single_string(&opts.value_field, &opts.value);

    let settings = ProducerSettings::new(&config.kafka.broker, &opts.transaction_id);
    let mut publisher = tokio::task::block_in_place(|| TransactionalPublisher::open(settings))?;

    let outcome = publish_and_measure(&mut publisher, &mut probe, opts, &key, &value).await;

    // Close on every path so dropping never runs librdkafka calls on a worker thread.
    tokio::task::block_in_place(|| publisher.close());
    outcome
}

async fn publish_and_measure<P: RowProbe + ?Sized>(
    publisher: &mut TransactionalPublisher,
    probe: &mut P,
    opts: &RunOpts,
    key: &[u8],
    value: &Envelope,
) -> anyhow::Result<RunOutcome> {
    publisher.publish(&opts.topic, key, Some(value))?;
    tokio::task::block_in_place(|| publisher.commit())?;
    info!(
        "Committed probe record to '{}', polling for up to {:?}",
        opts.topic, opts.deadline
    );

    let policy = if opts.abort_on_query_error {
        QueryErrorPolicy::Abort
    } else {
        QueryErrorPolicy::Continue
    };
    let report = VerificationPoller::new(opts.deadline)
        .with_query_error_policy(policy)
        .poll_until_found(probe)
        .await
        .context("Verification query failed")?;

    let log = LatencyLog::new(&opts.latency_log);
    let recorded_nanos = log.record(report.elapsed)?;
    info!("Appended {recorded_nanos}ns to {:?}", log.path());

    Ok(RunOutcome {
        report,
        recorded_nanos,
    })
}
