use super::PullRequestSource;
use crate::model::PullRequestRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads pull requests from a JSON document previously exported from the
/// GitHub API (an array of pull request objects).
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn parse_records(raw: &str) -> anyhow::Result<Vec<PullRequestRecord>> {
    let records: Vec<PullRequestRecord> = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("failed to parse pull requests: {}", e))?;
    Ok(records)
}

#[async_trait]
impl PullRequestSource for FileSource {
    async fn fetch_pull_requests(&self) -> anyhow::Result<Vec<PullRequestRecord>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            anyhow::anyhow!("failed to read input {}: {}", self.path.display(), e)
        })?;
        let records = parse_records(&raw)?;
        tracing::debug!(
            event = "input_loaded",
            path = %self.path.display(),
            records = records.len()
        );
        Ok(records)
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory records, for tests and merged exports.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub records: Vec<PullRequestRecord>,
}

#[async_trait]
impl PullRequestSource for MemorySource {
    async fn fetch_pull_requests(&self) -> anyhow::Result<Vec<PullRequestRecord>> {
        Ok(self.records.clone())
    }

    fn source_name(&self) -> String {
        "memory".to_string()
    }
}
