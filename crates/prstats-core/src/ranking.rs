//! Ordering of per-user groups for summaries and detailed listings.

use crate::collectors::UserAggregate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scalar metric groups are ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Every record in the group
    Total,
    /// Merged records in the group
    Merged,
}

pub trait Ranked {
    fn rank_value(&self, by: RankBy) -> u64;
    fn rank_name(&self) -> &str;
    fn rank_id(&self) -> u64;
}

impl Ranked for UserAggregate {
    fn rank_value(&self, by: RankBy) -> u64 {
        match by {
            RankBy::Total => self.total(),
            RankBy::Merged => self.merged(),
        }
    }

    fn rank_name(&self) -> &str {
        &self.user().login
    }

    fn rank_id(&self) -> u64 {
        self.user().id
    }
}

/// Total order: metric ascending, then name, then id.
pub fn compare<T: Ranked + ?Sized>(a: &T, b: &T, by: RankBy) -> Ordering {
    a.rank_value(by)
        .cmp(&b.rank_value(by))
        .then_with(|| a.rank_name().cmp(b.rank_name()))
        .then_with(|| a.rank_id().cmp(&b.rank_id()))
}

pub fn max_by_rank<'a, T: Ranked>(groups: &[&'a T], by: RankBy) -> Option<&'a T> {
    groups.iter().copied().max_by(|a, b| compare(*a, *b, by))
}

pub fn min_by_rank<'a, T: Ranked>(groups: &[&'a T], by: RankBy) -> Option<&'a T> {
    groups.iter().copied().min_by(|a, b| compare(*a, *b, by))
}

/// Every group whose metric equals the highest value, ordered by name.
pub fn find_maxima<'a, T: Ranked>(groups: &[&'a T], by: RankBy) -> Vec<&'a T> {
    match groups.iter().map(|g| g.rank_value(by)).max() {
        Some(top) => ties(groups, by, top),
        None => Vec::new(),
    }
}

/// Every group whose metric equals the lowest value, ordered by name.
pub fn find_minima<'a, T: Ranked>(groups: &[&'a T], by: RankBy) -> Vec<&'a T> {
    match groups.iter().map(|g| g.rank_value(by)).min() {
        Some(bottom) => ties(groups, by, bottom),
        None => Vec::new(),
    }
}

fn ties<'a, T: Ranked>(groups: &[&'a T], by: RankBy, value: u64) -> Vec<&'a T> {
    let mut found: Vec<&'a T> = groups
        .iter()
        .copied()
        .filter(|g| g.rank_value(by) == value)
        .collect();
    found.sort_by(|a, b| compare(*a, *b, by));
    found
}

/// Groups ordered for detailed output: highest metric first, ties by name.
pub fn sorted_descending<'a, T: Ranked>(groups: &[&'a T], by: RankBy) -> Vec<&'a T> {
    let mut sorted = groups.to_vec();
    sorted.sort_by(|a, b| {
        b.rank_value(by)
            .cmp(&a.rank_value(by))
            .then_with(|| a.rank_name().cmp(b.rank_name()))
            .then_with(|| a.rank_id().cmp(&b.rank_id()))
    });
    sorted
}

/// Mean metric per group; `None` when there are no groups.
pub fn average_per_group(total: u64, groups: usize) -> Option<f64> {
    if groups == 0 {
        None
    } else {
        Some(total as f64 / groups as f64)
    }
}
