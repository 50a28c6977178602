//! Error types for the transactional producer.

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors that can occur while publishing inside a transaction.
#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("Failed to start transactional producer '{transaction_id}' on {broker}: {source}")]
    Connection {
        broker: String,
        transaction_id: String,
        #[source]
        source: KafkaError,
    },

    #[error("Failed to serialize message value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to enqueue message for topic '{topic}': {source}")]
    Enqueue {
        topic: String,
        #[source]
        source: KafkaError,
    },

    #[error("Transaction '{transaction_id}' failed: {source}")]
    Transaction {
        transaction_id: String,
        #[source]
        source: KafkaError,
    },

    #[error("Cannot {operation} while the transaction is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}
