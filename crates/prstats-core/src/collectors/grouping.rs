use super::record::RecordAggregator;
use super::user::{GroupBy, UserAggregate};
use crate::errors::StatsError;
use crate::model::{PullRequestRecord, UserRef};
use crate::providers::MergedByResolver;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingOptions {
    pub by_author: bool,
    pub by_merging_user: bool,
}

impl GroupingOptions {
    pub fn all() -> Self {
        Self {
            by_author: true,
            by_merging_user: true,
        }
    }
}

/// Global aggregate plus lazily created per-author and per-merging-user children.
///
/// Every record first updates the global aggregate and is then routed to at
/// most one child per enabled grouping.
#[derive(Debug, Clone)]
pub struct GroupingAggregator {
    options: GroupingOptions,
    overall: RecordAggregator,
    authors: HashMap<u64, UserAggregate>,
    merging_users: HashMap<u64, UserAggregate>,
    unresolved_mergers: u64,
    skipped_records: u64,
}

impl GroupingAggregator {
    pub fn new(options: GroupingOptions, now: DateTime<Utc>) -> Self {
        Self {
            options,
            overall: RecordAggregator::new(now),
            authors: HashMap::new(),
            merging_users: HashMap::new(),
            unresolved_mergers: 0,
            skipped_records: 0,
        }
    }

    pub fn start(&mut self) {
        self.overall.start();
        self.authors.clear();
        self.merging_users.clear();
        self.unresolved_mergers = 0;
        self.skipped_records = 0;
    }

    pub fn collect(
        &mut self,
        pr: &PullRequestRecord,
        resolver: &dyn MergedByResolver,
    ) -> Result<(), StatsError> {
        self.overall.collect(pr)?;

        if !self.options.by_author && !self.options.by_merging_user {
            return Ok(());
        }
        // shared by both groupings; author children use it for self-merge counts
        let merged_by = self.effective_merged_by(pr, resolver);
        let now = self.overall.now();

        if self.options.by_author {
            let child = child_for(&mut self.authors, GroupBy::Author(pr.user.clone()), now);
            child.collect(pr, merged_by.as_ref())?;
        }

        if self.options.by_merging_user && pr.is_merged() {
            match merged_by {
                Some(merger) => {
                    let child = child_for(
                        &mut self.merging_users,
                        GroupBy::MergingUser(merger.clone()),
                        now,
                    );
                    child.collect(pr, Some(&merger))?;
                }
                None => {
                    self.unresolved_mergers += 1;
                    tracing::warn!(
                        event = "merging_user_unresolved",
                        pr = pr.number,
                        "Unable to determine merging user for PR #{}",
                        pr.number
                    );
                }
            }
        }
        Ok(())
    }

    /// The inline merging identity, or the resolver's answer for merged
    /// records that arrived without one. Resolution failures are a data gap.
    fn effective_merged_by(
        &self,
        pr: &PullRequestRecord,
        resolver: &dyn MergedByResolver,
    ) -> Option<UserRef> {
        if !pr.is_merged() {
            return None;
        }
        if let Some(m) = &pr.merged_by {
            return Some(m.clone());
        }
        match resolver.resolve_merged_by(pr) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    event = "merging_user_lookup_failed",
                    pr = pr.number,
                    error = %e,
                    "Failed to obtain detailed information for PR #{}",
                    pr.number
                );
                None
            }
        }
    }

    pub fn end(&mut self) -> Result<(), StatsError> {
        self.overall.end()?;
        for child in self.authors.values_mut() {
            child.end()?;
        }
        for child in self.merging_users.values_mut() {
            child.end()?;
        }
        Ok(())
    }

    /// Combines an independently collected aggregator into this one.
    ///
    /// Both sides must share grouping options and the reference time.
    pub fn merge(&mut self, other: &GroupingAggregator) -> Result<(), StatsError> {
        if self.options != other.options {
            return Err(StatsError::invalid_argument(format!(
                "cannot merge aggregators with different groupings ({:?} vs {:?})",
                self.options, other.options
            )));
        }
        let now = self.overall.now();
        if now != other.overall.now() {
            return Err(StatsError::invalid_argument(format!(
                "cannot merge aggregators measured at {} and {}",
                now,
                other.overall.now()
            )));
        }
        self.overall.merge(&other.overall)?;
        for (id, theirs) in &other.authors {
            let ours = self.authors.entry(*id).or_insert_with(|| {
                let mut child = UserAggregate::new(theirs.group().clone(), now);
                child.start();
                child
            });
            ours.merge(theirs)?;
        }
        for (id, theirs) in &other.merging_users {
            let ours = self.merging_users.entry(*id).or_insert_with(|| {
                let mut child = UserAggregate::new(theirs.group().clone(), now);
                child.start();
                child
            });
            ours.merge(theirs)?;
        }
        self.unresolved_mergers += other.unresolved_mergers;
        self.skipped_records += other.skipped_records;
        Ok(())
    }

    pub fn options(&self) -> GroupingOptions {
        self.options
    }

    pub fn overall(&self) -> &RecordAggregator {
        &self.overall
    }

    /// Per-author children, unordered.
    pub fn authors(&self) -> Vec<&UserAggregate> {
        self.authors.values().collect()
    }

    pub fn author(&self, user_id: u64) -> Option<&UserAggregate> {
        self.authors.get(&user_id)
    }

    pub fn total_authors(&self) -> usize {
        self.authors.len()
    }

    /// Per-merging-user children, unordered.
    pub fn merging_users(&self) -> Vec<&UserAggregate> {
        self.merging_users.values().collect()
    }

    pub fn merging_user(&self, user_id: u64) -> Option<&UserAggregate> {
        self.merging_users.get(&user_id)
    }

    pub fn total_merging_users(&self) -> usize {
        self.merging_users.len()
    }

    /// Merged records that could not be attributed to a merging user.
    pub fn unresolved_mergers(&self) -> u64 {
        self.unresolved_mergers
    }

    /// Counts a record the caller rejected instead of collecting.
    pub fn record_skipped(&mut self) {
        self.skipped_records += 1;
    }

    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }
}

fn child_for(
    children: &mut HashMap<u64, UserAggregate>,
    group: GroupBy,
    now: DateTime<Utc>,
) -> &mut UserAggregate {
    children.entry(group.user().id).or_insert_with(|| {
        tracing::debug!(event = "group_created", group = ?group);
        let mut child = UserAggregate::new(group, now);
        child.start();
        child
    })
}
