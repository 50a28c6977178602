//! Transactional Kafka producer for sink-latency.
//!
//! This library wraps an rdkafka producer configured for exactly-once
//! delivery: idempotence on, `acks=all`, one in-flight request per
//! connection, bounded retries with a fixed backoff, zstd compression, and
//! no topic auto-creation. A transaction is begun as soon as the publisher
//! is opened.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sink_latency_envelope::Envelope;
//! use sink_latency_txn_producer::{ProducerSettings, TransactionalPublisher};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ProducerSettings::new("localhost:9092", "test_transaction");
//!     let mut publisher = TransactionalPublisher::open(settings)?;
//!
//!     let key = Envelope::single_string("id", "random_id").to_vec()?;
//!     let value = Envelope::single_string("value", "random_value");
//!     publisher.publish("test_topic", &key, Some(&value))?;
//!
//!     publisher.commit()?;
//!     publisher.close();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod publisher;
pub mod settings;

pub use error::PublisherError;
pub use publisher::{encode_value, TransactionalPublisher};
pub use settings::{
    ProducerSettings, DEFAULT_MAX_RETRIES, DEFAULT_OPERATION_TIMEOUT, DEFAULT_RETRY_BACKOFF,
};
