//! sink-latency library
//!
//! Provisions a Kafka → Kafka Connect JDBC sink → PostgreSQL pipeline and
//! measures how long one transactional record takes to surface as a row.
//!
//! # Commands
//!
//! - `create` - create topics, run the SQL table scripts, register sink connectors
//! - `delete` - remove connectors, topics, and every public table
//! - `run` - publish one record in a transaction and time its arrival
//! - `stats` - summarize the latency log
//!
//! # CLI Usage
//!
//! ```bash
//! sink-latency create --topics-file topics.yml --sql-dir sql
//! sink-latency run --topic test_topic --deadline 3s
//! sink-latency stats --latency-log data.txt
//! sink-latency delete
//! ```
//!
//! The core pieces live in their own crates:
//!
//! - `sink_latency_envelope` - schema-carrying JSON envelopes
//! - `sink_latency_txn_producer` - exactly-once transactional producer
//! - `sink_latency_verify` - deadline-bounded poller, latency log, statistics

pub mod config;
pub mod provision;
pub mod run;
pub mod stats;

pub use config::{
    ConnectOpts, InsertMode, KafkaOpts, PipelineConfig, PostgresOpts, StackFiles, TopicsFile,
};
pub use run::{run_latency_test, RunOpts, RunOutcome};
pub use stats::{load_stats, StatsOpts};
