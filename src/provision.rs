//! Stack provisioning: topics, sink tables, and sink connectors.
//!
//! Steps run in sequence without retries; the first failure aborts the
//! command with context about which step failed.

pub mod connectors;
pub mod tables;
pub mod topics;

use crate::config::{PipelineConfig, StackFiles, TopicsFile};
use anyhow::Context;
use connectors::{connector_name, ConnectClient, NewConnector};
use tracing::info;

/// Bring the pipeline up: topics, then tables, then one connector per topic.
pub async fn setup_stack(config: &PipelineConfig, files: &StackFiles) -> anyhow::Result<()> {
    let topic_names = TopicsFile::from_file(&files.topics_file)?.topics;
    info!("Provisioning {} topics", topic_names.len());

    topics::create_topics(&config.kafka.broker, &topic_names).await?;

    let client = tables::connect(&config.postgres.connection_string()).await?;
    let scripts = tables::run_sql_scripts(&client, &files.sql_dir).await?;
    info!("Executed {} SQL scripts", scripts.len());
    drop(client);

    let connect = ConnectClient::new(&config.connect.kafka_connect);
    for topic in &topic_names {
        connect
            .create_connector(&NewConnector::jdbc_sink(config, topic))
            .await
            .with_context(|| format!("Failed to set up sink for topic '{topic}'"))?;
    }

    Ok(())
}

/// Tear the pipeline down: connectors, then topics, then every public table.
pub async fn teardown_stack(config: &PipelineConfig, files: &StackFiles) -> anyhow::Result<()> {
    let topic_names = TopicsFile::from_file(&files.topics_file)?.topics;

    let connect = ConnectClient::new(&config.connect.kafka_connect);
    for topic in &topic_names {
        connect.delete_connector(&connector_name(topic)).await?;
    }

    topics::delete_topics(&config.kafka.broker, &topic_names).await?;

    let client = tables::connect(&config.postgres.connection_string()).await?;
    let dropped = tables::drop_public_tables(&client).await?;
    info!("Dropped {} tables", dropped.len());

    Ok(())
}
