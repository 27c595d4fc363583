//! Collaborators that feed the aggregation engine.

use crate::model::{PullRequestRecord, UserRef};
use async_trait::async_trait;

pub mod file;
pub mod github;

/// Delivers a finite, fully fetched sequence of pull requests.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn fetch_pull_requests(&self) -> anyhow::Result<Vec<PullRequestRecord>>;
    fn source_name(&self) -> String;
}

/// Looks up the merging identity of a merged record that arrived without one.
pub trait MergedByResolver {
    fn resolve_merged_by(&self, pr: &PullRequestRecord) -> anyhow::Result<Option<UserRef>>;
}

/// Resolver for sources that already carry every identity they have.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl MergedByResolver for NoResolver {
    fn resolve_merged_by(&self, _pr: &PullRequestRecord) -> anyhow::Result<Option<UserRef>> {
        Ok(None)
    }
}
