//! Sink table setup and teardown in PostgreSQL.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio_postgres::{Client, NoTls};
use tracing::info;

/// Connect to PostgreSQL and spawn the connection driver.
pub async fn connect(connection_string: &str) -> anyhow::Result<Client> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {e}");
        }
    });

    Ok(client)
}

/// `*.sql` files in `dir`, sorted by name.
pub fn list_sql_scripts(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read SQL directory {dir:?}"))?
    {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            scripts.push(path);
        }
    }
    scripts.sort();
    Ok(scripts)
}

/// Execute every script in `dir` in name order. Returns the scripts run.
pub async fn run_sql_scripts(client: &Client, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let scripts = list_sql_scripts(dir)?;
    for script in &scripts {
        info!("Executing SQL script {script:?}");
        let sql = std::fs::read_to_string(script)
            .with_context(|| format!("Failed to read SQL script {script:?}"))?;
        client
            .batch_execute(&sql)
            .await
            .with_context(|| format!("Failed to execute SQL script {script:?}"))?;
        info!("Executed SQL script {script:?}");
    }
    Ok(scripts)
}

/// Drop every table in the `public` schema. Returns the dropped names.
pub async fn drop_public_tables(client: &Client) -> anyhow::Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
            &[],
        )
        .await
        .context("Failed to list tables")?;

    let tables: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
    for table in &tables {
        info!("Discovered table '{table}'");
    }

    for table in &tables {
        client
            .batch_execute(&format!("DROP TABLE {} CASCADE", quote_identifier(table)))
            .await
            .with_context(|| format!("Failed to drop table '{table}'"))?;
        info!("Dropped table '{table}'");
    }

    Ok(tables)
}

/// Double-quote an identifier read back from the catalog.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_sql_scripts_sorted_files_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("02_orders.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("01_test_topic.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("README.md"), "# Sink tables").unwrap();
        std::fs::write(dir.path().join("01_test_topic.sql~"), "SELECT 1;").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let scripts = list_sql_scripts(dir.path()).unwrap();
        let names: Vec<_> = scripts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01_test_topic.sql", "02_orders.sql"]);
    }

    #[test]
    fn test_list_sql_scripts_missing_dir() {
        let err = list_sql_scripts(Path::new("/nonexistent/sql")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/sql"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("test_topic_table"), "\"test_topic_table\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
