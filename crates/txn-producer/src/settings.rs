//! Producer configuration for exactly-once delivery.

use rdkafka::ClientConfig;
use std::time::Duration;

/// Retry attempts for a transient send failure.
pub const DEFAULT_MAX_RETRIES: u32 = 30;

/// Fixed backoff between send retries.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Timeout for blocking transaction calls (init, commit, abort).
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`crate::TransactionalPublisher`].
///
/// The reliability properties (`acks=all`, a single in-flight request,
/// idempotence, no topic auto-creation) are not configurable. Only the
/// broker, the transaction ID, and the retry/timeout knobs are.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    pub broker: String,
    pub transaction_id: String,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub operation_timeout: Duration,
}

impl ProducerSettings {
    pub fn new(broker: &str, transaction_id: &str) -> Self {
        Self {
            broker: broker.to_string(),
            transaction_id: transaction_id.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Set the timeout used for init/commit/abort.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set retry count and backoff for transient send failures.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    /// Build the librdkafka client configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.broker)
            .set("client.id", &self.transaction_id)
            .set("transactional.id", &self.transaction_id)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "1")
            .set("retries", self.max_retries.to_string())
            .set("retry.backoff.ms", self.retry_backoff.as_millis().to_string())
            .set("compression.type", "zstd")
            .set("allow.auto.create.topics", "false");
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_exactly_once_properties() {
        let config = ProducerSettings::new("localhost:9092", "test_transaction").client_config();

        assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(config.get("transactional.id"), Some("test_transaction"));
        assert_eq!(config.get("client.id"), Some("test_transaction"));
        assert_eq!(config.get("enable.idempotence"), Some("true"));
        assert_eq!(config.get("acks"), Some("all"));
        assert_eq!(
            config.get("max.in.flight.requests.per.connection"),
            Some("1")
        );
        assert_eq!(config.get("retries"), Some("30"));
        assert_eq!(config.get("retry.backoff.ms"), Some("10"));
        assert_eq!(config.get("compression.type"), Some("zstd"));
        assert_eq!(config.get("allow.auto.create.topics"), Some("false"));
    }

    #[test]
    fn test_with_retries_overrides_defaults() {
        let config = ProducerSettings::new("broker:9092", "txn")
            .with_retries(5, Duration::from_millis(250))
            .client_config();

        assert_eq!(config.get("retries"), Some("5"));
        assert_eq!(config.get("retry.backoff.ms"), Some("250"));
    }
}
