//! Transactional publisher.
//!
//! A [`TransactionalPublisher`] owns one producer and at most one open
//! transaction:
//!
//! ```text
//! open ──► Open ──publish*──► Open ──commit──► Committed ──close──► Closed
//!                                   └─(fail)──► Failed    ──close──► Closed
//! ```
//!
//! `publish` only enqueues. The records reach the broker on librdkafka's
//! background thread; `commit` is the point where all of them are known to
//! be written exactly once.

use crate::error::PublisherError;
use crate::settings::ProducerSettings;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Open,
    Committed,
    Failed,
    Closed,
}

impl TxnState {
    fn as_str(self) -> &'static str {
        match self {
            TxnState::Open => "open",
            TxnState::Committed => "committed",
            TxnState::Failed => "failed",
            TxnState::Closed => "closed",
        }
    }
}

/// Kafka producer running in idempotent, transactional mode.
pub struct TransactionalPublisher {
    producer: Option<FutureProducer>,
    settings: ProducerSettings,
    state: TxnState,
}

impl TransactionalPublisher {
    /// Connect, initialise transactions, and begin the first transaction.
    ///
    /// Blocks for up to `settings.operation_timeout` while the transaction
    /// coordinator is located.
    pub fn open(settings: ProducerSettings) -> Result<Self, PublisherError> {
        let connection_error = |source: KafkaError| PublisherError::Connection {
            broker: settings.broker.clone(),
            transaction_id: settings.transaction_id.clone(),
            source,
        };

        let producer: FutureProducer = settings
            .client_config()
            .create()
            .map_err(connection_error)?;

        producer
            .init_transactions(settings.operation_timeout)
            .map_err(connection_error)?;
        producer.begin_transaction().map_err(connection_error)?;

        info!(
            "Opened transaction '{}' on {}",
            settings.transaction_id, settings.broker
        );

        Ok(Self {
            producer: Some(producer),
            settings,
            state: TxnState::Open,
        })
    }

    pub fn transaction_id(&self) -> &str {
        &self.settings.transaction_id
    }

    pub fn is_open(&self) -> bool {
        self.state == TxnState::Open
    }

    /// Enqueue one record in the open transaction.
    ///
    /// `value` is serialized to JSON; `None` sends a record without a payload
    /// (a tombstone), which the sink treats as a delete.
    pub fn publish<V>(
        &mut self,
        topic: &str,
        key: &[u8],
        value: Option<&V>,
    ) -> Result<(), PublisherError>
    where
        V: Serialize + ?Sized,
    {
        let producer = self.producer_in_txn("publish")?;
        let payload = encode_value(value)?;

        let mut record = FutureRecord::<[u8], [u8]>::to(topic).key(key);
        if let Some(bytes) = payload.as_deref() {
            record = record.payload(bytes);
        }

        // The delivery future is dropped: acknowledgment is observed through commit.
        let _ = producer
            .send_result(record)
            .map_err(|(source, _)| PublisherError::Enqueue {
                topic: topic.to_string(),
                source,
            })?;

        debug!(
            "Enqueued record for topic '{}' ({} key bytes, {} value bytes)",
            topic,
            key.len(),
            payload.as_ref().map_or(0, Vec::len)
        );
        Ok(())
    }

    /// Commit the open transaction, waiting for every enqueued record.
    ///
    /// If the broker reports that the transaction can only be aborted, it is
    /// aborted before the error is returned. Either way the publisher is left
    /// in the failed state.
    pub fn commit(&mut self) -> Result<(), PublisherError> {
        let timeout = self.settings.operation_timeout;
        let producer = self.producer_in_txn("commit")?;

        match producer.commit_transaction(timeout) {
            Ok(()) => {
                self.state = TxnState::Committed;
                info!("Committed transaction '{}'", self.settings.transaction_id);
                Ok(())
            }
            Err(source) => {
                if let KafkaError::Transaction(ref rd) = source {
                    if rd.txn_requires_abort() {
                        if let Err(e) = producer.abort_transaction(timeout) {
                            warn!(
                                "Failed to abort transaction '{}': {}",
                                self.settings.transaction_id, e
                            );
                        }
                    }
                }
                self.state = TxnState::Failed;
                Err(PublisherError::Transaction {
                    transaction_id: self.settings.transaction_id.clone(),
                    source,
                })
            }
        }
    }

    /// Release the producer. Calling this more than once is a no-op.
    ///
    /// A transaction that is still open is aborted.
    pub fn close(&mut self) {
        let Some(producer) = self.producer.take() else {
            return;
        };

        if self.state == TxnState::Open {
            if let Err(e) = producer.abort_transaction(self.settings.operation_timeout) {
                warn!(
                    "Failed to abort open transaction '{}' on close: {}",
                    self.settings.transaction_id, e
                );
            }
        }

        drop(producer);
        self.state = TxnState::Closed;
        debug!("Closed producer '{}'", self.settings.transaction_id);
    }

    /// Best-effort cleanup: commit, then close. Commit errors are logged, not returned.
    pub fn commit_and_close(&mut self) {
        if self.is_open() {
            if let Err(e) = self.commit() {
                warn!("Ignoring commit failure during cleanup: {e}");
            }
        }
        self.close();
    }

    fn producer_in_txn(&self, operation: &'static str) -> Result<&FutureProducer, PublisherError> {
        match (&self.producer, self.state) {
            (Some(producer), TxnState::Open) => Ok(producer),
            (_, state) => Err(PublisherError::InvalidState {
                operation,
                state: state.as_str(),
            }),
        }
    }
}

impl Drop for TransactionalPublisher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Serialize a message value. `None` stays `None` so the record carries no payload.
pub fn encode_value<V>(value: Option<&V>) -> Result<Option<Vec<u8>>, PublisherError>
where
    V: Serialize + ?Sized,
{
    value
        .map(serde_json::to_vec)
        .transpose()
        .map_err(PublisherError::Serialization)
}
