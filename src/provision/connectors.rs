//! JDBC sink connectors registered through the Kafka Connect REST API.

use crate::config::{InsertMode, PipelineConfig};
use anyhow::Context;
use reqwest::StatusCode;
use serde::Serialize;
use sink_latency_verify::sink_table_name;

const JDBC_SINK_CLASS: &str = "io.confluent.connect.jdbc.JdbcSinkConnector";
const JSON_CONVERTER_CLASS: &str = "org.apache.kafka.connect.json.JsonConverter";

/// Connector name for `topic`.
pub fn connector_name(topic: &str) -> String {
    format!("{topic}-connector")
}

/// Body of `POST /connectors`.
#[derive(Debug, Clone, Serialize)]
pub struct NewConnector {
    pub name: String,
    pub config: JdbcSinkConfig,
}

/// JDBC sink settings. Field names are the Kafka Connect property keys.
#[derive(Debug, Clone, Serialize)]
pub struct JdbcSinkConfig {
    #[serde(rename = "connector.class")]
    pub connector_class: String,
    #[serde(rename = "tasks.max")]
    pub tasks_max: String,
    pub topics: String,
    #[serde(rename = "connection.url")]
    pub connection_url: String,
    #[serde(rename = "connection.user")]
    pub connection_user: String,
    #[serde(rename = "connection.password")]
    pub connection_password: String,
    #[serde(rename = "auto.create")]
    pub auto_create: String,
    #[serde(rename = "auto.evolve")]
    pub auto_evolve: String,
    #[serde(rename = "insert.mode")]
    pub insert_mode: InsertMode,
    #[serde(rename = "table.name.format")]
    pub table_name_format: String,
    #[serde(rename = "value.converter")]
    pub value_converter: String,
    #[serde(rename = "value.converter.schemas.enable")]
    pub value_converter_schemas_enable: String,
    #[serde(rename = "key.converter")]
    pub key_converter: String,
    #[serde(rename = "key.converter.schemas.enable")]
    pub key_converter_schemas_enable: String,
    #[serde(rename = "delete.enabled")]
    pub delete_enabled: String,
    #[serde(rename = "delete.key.fields")]
    pub delete_key_fields: String,
    #[serde(rename = "poll.interval.ms")]
    pub poll_interval_ms: u64,
    /// Required for upsert.
    #[serde(rename = "pk.mode", skip_serializing_if = "Option::is_none")]
    pub pk_mode: Option<String>,
    #[serde(rename = "pk.fields", skip_serializing_if = "Option::is_none")]
    pub pk_fields: Option<String>,
}

impl NewConnector {
    /// Sink from `topic` into `<topic>_table`.
    pub fn jdbc_sink(config: &PipelineConfig, topic: &str) -> Self {
        let connect = &config.connect;
        let postgres = &config.postgres;
        let upsert = connect.insert_mode == InsertMode::Upsert;

        Self {
            name: connector_name(topic),
            config: JdbcSinkConfig {
                connector_class: JDBC_SINK_CLASS.to_string(),
                tasks_max: "1".to_string(),
                topics: topic.to_string(),
                connection_url: format!(
                    "jdbc:postgresql://{}/{}",
                    connect.connect_jdbc_host, postgres.psql_db
                ),
                connection_user: postgres.psql_user.clone(),
                connection_password: postgres.psql_pass.clone(),
                auto_create: "false".to_string(),
                auto_evolve: "false".to_string(),
                insert_mode: connect.insert_mode,
                table_name_format: sink_table_name(topic),
                value_converter: JSON_CONVERTER_CLASS.to_string(),
                value_converter_schemas_enable: "true".to_string(),
                key_converter: JSON_CONVERTER_CLASS.to_string(),
                key_converter_schemas_enable: "true".to_string(),
                delete_enabled: "true".to_string(),
                delete_key_fields: config.id_field.clone(),
                poll_interval_ms: u64::try_from(connect.poll_interval.as_millis())
                    .unwrap_or(u64::MAX),
                pk_mode: upsert.then(|| "record_key".to_string()),
                pk_fields: upsert.then(|| config.id_field.clone()),
            },
        }
    }
}

/// Minimal client for the Kafka Connect REST API.
pub struct ConnectClient {
    http: reqwest::Client,
    base_url: String,
}

impl ConnectClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a connector. Kafka Connect answers 201 on success.
    pub async fn create_connector(&self, connector: &NewConnector) -> anyhow::Result<()> {
        let url = format!("{}/connectors", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(connector)
            .send()
            .await
            .with_context(|| format!("Failed to POST {url}"))?;

        expect_status(response, StatusCode::CREATED, "create", &connector.name).await?;
        tracing::info!("Created Kafka Connect connector '{}'", connector.name);
        Ok(())
    }

    /// Remove a connector. Kafka Connect answers 204 on success.
    pub async fn delete_connector(&self, name: &str) -> anyhow::Result<()> {
        let url = format!("{}/connectors/{}", self.base_url, name);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("Failed to DELETE {url}"))?;

        expect_status(response, StatusCode::NO_CONTENT, "delete", name).await?;
        tracing::info!("Deleted Kafka Connect connector '{name}'");
        Ok(())
    }
}

async fn expect_status(
    response: reqwest::Response,
    expected: StatusCode,
    action: &str,
    name: &str,
) -> anyhow::Result<()> {
    let status = response.status();
    if status == expected {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("Failed to {action} Kafka Connect connector '{name}': {body}, status code: {status}")
}
