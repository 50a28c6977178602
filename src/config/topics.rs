//! Topic list file.
//!
//! ```yaml
//! topics:
//!   - test_topic
//!   - orders
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Default topics file, relative to the working directory.
pub const DEFAULT_TOPICS_FILE: &str = "topics.yml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicsFile {
    pub topics: Vec<String>,
}

impl TopicsFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topics file {path:?}"))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse topics file {path:?}"))
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let file: TopicsFile = serde_yaml::from_str(yaml)?;
        if let Some(blank) = file.topics.iter().find(|t| t.trim().is_empty()) {
            anyhow::bail!("Topic names must not be blank: {blank:?}");
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topics() {
        let file = TopicsFile::from_yaml("topics:\n  - test_topic\n  - orders\n").unwrap();
        assert_eq!(file.topics, vec!["test_topic", "orders"]);
    }

    #[test]
    fn test_missing_topics_key_is_an_error() {
        assert!(TopicsFile::from_yaml("tables:\n  - a\n").is_err());
    }

    #[test]
    fn test_blank_topic_is_an_error() {
        assert!(TopicsFile::from_yaml("topics:\n  - ''\n").is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let err = TopicsFile::from_file("/nonexistent/topics.yml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/topics.yml"));
    }
}
