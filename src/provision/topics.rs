//! Topic creation and deletion through the Kafka admin API.

use anyhow::Context;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::time::Duration;

const ADMIN_TIMEOUT: Duration = Duration::from_secs(5);

fn admin_client(broker: &str) -> anyhow::Result<AdminClient<DefaultClientContext>> {
    ClientConfig::new()
        .set("bootstrap.servers", broker)
        .create()
        .context("Failed to create admin client")
}

/// Create each topic with one partition and replication factor 1.
///
/// A topic that already exists is left as is.
pub async fn create_topics(broker: &str, topics: &[String]) -> anyhow::Result<()> {
    let admin_client = admin_client(broker)?;

    let new_topics: Vec<NewTopic> = topics
        .iter()
        .map(|topic| NewTopic::new(topic, 1, TopicReplication::Fixed(1)))
        .collect();
    let opts = AdminOptions::new().operation_timeout(Some(ADMIN_TIMEOUT));

    let results = admin_client
        .create_topics(&new_topics, &opts)
        .await
        .context("Failed to create topics")?;

    for result in results {
        match result {
            Ok(topic_name) => tracing::info!("Created topic '{topic_name}'"),
            Err((topic_name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                tracing::info!("Topic '{topic_name}' already exists");
            }
            Err((topic_name, code)) => {
                anyhow::bail!("Failed to create topic '{topic_name}': {code}");
            }
        }
    }

    Ok(())
}

/// Delete each topic. A topic that does not exist is skipped.
pub async fn delete_topics(broker: &str, topics: &[String]) -> anyhow::Result<()> {
    let admin_client = admin_client(broker)?;

    let names: Vec<&str> = topics.iter().map(String::as_str).collect();
    let opts = AdminOptions::new().operation_timeout(Some(ADMIN_TIMEOUT));

    let results = admin_client
        .delete_topics(&names, &opts)
        .await
        .context("Failed to delete topics")?;

    for result in results {
        match result {
            Ok(topic_name) => tracing::info!("Deleted topic '{topic_name}'"),
            Err((topic_name, RDKafkaErrorCode::UnknownTopicOrPartition)) => {
                tracing::info!("Topic '{topic_name}' does not exist");
            }
            Err((topic_name, code)) => {
                anyhow::bail!("Failed to delete topic '{topic_name}': {code}");
            }
        }
    }

    Ok(())
}
