//! Single-row existence probes against the destination store.

use crate::error::VerifyError;
use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

/// Result of one successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found,
    NotFound,
}

/// A lookup that the poller calls repeatedly.
///
/// `Ok(NotFound)` means the store answered and has no matching row yet.
/// `Err` means the lookup itself failed.
#[async_trait]
pub trait RowProbe: Send {
    async fn probe(&mut self) -> Result<ProbeOutcome, VerifyError>;
}

/// The existence query run against `<topic>_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeQuery {
    pub table: String,
    pub id_field: String,
    /// When set, only a row whose id equals this value counts.
    pub key: Option<String>,
}

impl ProbeQuery {
    /// Query the sink table of `topic`.
    pub fn for_topic(topic: &str, id_field: &str) -> Self {
        Self {
            table: sink_table_name(topic),
            id_field: id_field.to_string(),
            key: None,
        }
    }

    /// Require the row's id to match `key`.
    pub fn matching_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Render the SQL text. Identifiers are validated, not quoted.
    pub fn sql(&self) -> Result<String, VerifyError> {
        let table = checked_identifier(&self.table)?;
        let id_field = checked_identifier(&self.id_field)?;
        Ok(match self.key {
            Some(_) => format!("SELECT {id_field} FROM {table} WHERE {id_field} = $1 LIMIT 1"),
            None => format!("SELECT {id_field} FROM {table} LIMIT 1"),
        })
    }
}

/// Name of the table the sink connector writes `topic` into.
pub fn sink_table_name(topic: &str) -> String {
    format!("{topic}_table")
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*` only.
pub fn checked_identifier(name: &str) -> Result<&str, VerifyError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(VerifyError::InvalidIdentifier(name.to_string()))
    }
}

/// [`RowProbe`] backed by a dedicated PostgreSQL connection.
///
/// The connection is released when the probe is dropped.
pub struct PostgresProbe {
    client: Client,
    sql: String,
    key: Option<String>,
}

impl PostgresProbe {
    pub async fn connect(connection_string: &str, query: ProbeQuery) -> Result<Self, VerifyError> {
        let sql = query.sql()?;

        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(VerifyError::Connection)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        debug!("Prepared probe query: {sql}");
        Ok(Self {
            client,
            sql,
            key: query.key,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

#[async_trait]
impl RowProbe for PostgresProbe {
    async fn probe(&mut self) -> Result<ProbeOutcome, VerifyError> {
        let row = match &self.key {
            Some(key) => {
                let params: [&(dyn ToSql + Sync); 1] = [key];
                self.client.query_opt(self.sql.as_str(), &params).await?
            }
            None => self.client.query_opt(self.sql.as_str(), &[]).await?,
        };
        Ok(match row {
            Some(_) => ProbeOutcome::Found,
            None => ProbeOutcome::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_table_name() {
        assert_eq!(sink_table_name("test_topic"), "test_topic_table");
    }

    #[test]
    fn test_probe_sql_any_row() {
        let query = ProbeQuery::for_topic("test_topic", "id");
        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM test_topic_table LIMIT 1"
        );
    }

    #[test]
    fn test_probe_sql_matching_key() {
        let query = ProbeQuery::for_topic("test_topic", "id").matching_key("random_id");
        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM test_topic_table WHERE id = $1 LIMIT 1"
        );
        assert_eq!(query.key.as_deref(), Some("random_id"));
    }

    #[test]
    fn test_probe_sql_rejects_injection() {
        let query = ProbeQuery::for_topic("t; DROP TABLE users", "id");
        assert!(matches!(
            query.sql(),
            Err(VerifyError::InvalidIdentifier(_))
        ));

        let query = ProbeQuery::for_topic("events", "1id");
        assert!(matches!(
            query.sql(),
            Err(VerifyError::InvalidIdentifier(name)) if name == "1id"
        ));
    }

    #[test]
    fn test_checked_identifier() {
        assert!(checked_identifier("_private").is_ok());
        assert!(checked_identifier("Orders2024").is_ok());
        assert!(checked_identifier("").is_err());
        assert!(checked_identifier("with-dash").is_err());
        assert!(checked_identifier("with space").is_err());
    }
}
