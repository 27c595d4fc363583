use super::record::RecordAggregator;
use crate::errors::StatsError;
use crate::model::{PullRequestRecord, UserRef};
use chrono::{DateTime, Utc};

/// Which records a per-user aggregate accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBy {
    /// Records authored by the user
    Author(UserRef),
    /// Merged records whose merging identity is the user
    MergingUser(UserRef),
}

impl GroupBy {
    pub fn user(&self) -> &UserRef {
        match self {
            GroupBy::Author(u) | GroupBy::MergingUser(u) => u,
        }
    }

    /// Inclusion predicate. `merged_by` is the effective merging identity,
    /// which may have been resolved out of band when the record lacked one.
    pub fn admits(&self, pr: &PullRequestRecord, merged_by: Option<&UserRef>) -> bool {
        match self {
            GroupBy::Author(u) => pr.user.id == u.id,
            GroupBy::MergingUser(u) => pr.is_merged() && merged_by.is_some_and(|m| m.id == u.id),
        }
    }
}

/// Per-user child of a [`GroupingAggregator`](super::GroupingAggregator).
#[derive(Debug, Clone)]
pub struct UserAggregate {
    group: GroupBy,
    stats: RecordAggregator,
    self_merged: u64,
}

impl UserAggregate {
    pub fn new(group: GroupBy, now: DateTime<Utc>) -> Self {
        Self {
            group,
            stats: RecordAggregator::new(now),
            self_merged: 0,
        }
    }

    pub fn start(&mut self) {
        self.stats.start();
        self.self_merged = 0;
    }

    /// Returns `Ok(false)` when the record is not admitted by this group.
    pub fn collect(
        &mut self,
        pr: &PullRequestRecord,
        merged_by: Option<&UserRef>,
    ) -> Result<bool, StatsError> {
        if !self.group.admits(pr, merged_by) {
            return Ok(false);
        }
        self.stats.collect(pr)?;
        if pr.is_merged() && merged_by.is_some_and(|m| m.id == pr.user.id) {
            self.self_merged += 1;
        }
        Ok(true)
    }

    pub fn end(&mut self) -> Result<(), StatsError> {
        self.stats.end()
    }

    pub fn merge(&mut self, other: &UserAggregate) -> Result<(), StatsError> {
        if other.group != self.group {
            return Err(StatsError::invalid_argument(format!(
                "cannot merge group {:?} into {:?}",
                other.group, self.group
            )));
        }
        self.stats.merge(&other.stats)?;
        self.self_merged += other.self_merged;
        Ok(())
    }

    pub fn group(&self) -> &GroupBy {
        &self.group
    }

    pub fn user(&self) -> &UserRef {
        self.group.user()
    }

    pub fn stats(&self) -> &RecordAggregator {
        &self.stats
    }

    pub fn total(&self) -> u64 {
        self.stats.total()
    }

    pub fn merged(&self) -> u64 {
        self.stats.merged()
    }

    pub fn self_merged(&self) -> u64 {
        self.self_merged
    }

    /// Share of this group's records that were self-merged.
    pub fn self_merged_percentage(&self) -> Option<f64> {
        self.stats.percentage(self.self_merged)
    }
}
