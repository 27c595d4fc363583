//! Read-only snapshots of a finalized aggregation, rendered as text or JSON.

use crate::collectors::{GroupingAggregator, RecordAggregator, UserAggregate};
use crate::config::ReportConfig;
use crate::errors::StatsError;
use crate::model::UserRef;
use crate::ranking::{self, RankBy, Ranked};
use crate::stats::NumericStatsCollector;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod console;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentilePoint {
    pub rank: f64,
    pub value: f64,
    /// Samples at or below the whole-day part of `value`
    pub cumulative_frequency: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdPoint {
    pub days: u64,
    /// Fraction in `[0, 1]` of samples at or below `days`
    pub cumulative_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub count: u64,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub mean: Option<f64>,
    pub geometric_mean: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modes: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub percentiles: Vec<PercentilePoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ThresholdPoint>,
}

impl DistributionSummary {
    /// Frequency data (modes, percentiles, thresholds) is only filled in when
    /// `frequencies` is set and the collector holds samples.
    pub fn from_collector(
        c: &NumericStatsCollector,
        cfg: &ReportConfig,
        frequencies: bool,
    ) -> Result<Self, StatsError> {
        let mut summary = Self {
            count: c.count(),
            min: c.min(),
            max: c.max(),
            mean: c.mean(),
            geometric_mean: c.geometric_mean(),
            modes: Vec::new(),
            percentiles: Vec::new(),
            thresholds: Vec::new(),
        };
        if !frequencies || c.is_empty() {
            return Ok(summary);
        }

        summary.modes = c.modes()?;
        for &rank in &cfg.percentiles {
            let value = c.percentile(rank)?;
            summary.percentiles.push(PercentilePoint {
                rank,
                value,
                cumulative_frequency: c.cumulative_frequency(value.trunc() as u64)?,
            });
        }
        for &days in &cfg.cumulative_thresholds {
            summary.thresholds.push(ThresholdPoint {
                days,
                cumulative_percentage: c.cumulative_percentage(days)?,
            });
        }
        Ok(summary)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub total: u64,
    pub open: u64,
    pub merged: u64,
    pub closed: u64,
    pub open_mergeable: u64,
    pub open_percentage: Option<f64>,
    pub merged_percentage: Option<f64>,
    pub closed_percentage: Option<f64>,
    pub days_to_merge: DistributionSummary,
    pub days_open: DistributionSummary,
    pub days_to_close: DistributionSummary,
}

impl RecordSummary {
    pub fn from_aggregator(
        agg: &RecordAggregator,
        cfg: &ReportConfig,
        frequencies: bool,
    ) -> Result<Self, StatsError> {
        Ok(Self {
            total: agg.total(),
            open: agg.open(),
            merged: agg.merged(),
            closed: agg.closed(),
            open_mergeable: agg.open_mergeable(),
            open_percentage: agg.open_percentage(),
            merged_percentage: agg.merged_percentage(),
            closed_percentage: agg.closed_percentage(),
            days_to_merge: DistributionSummary::from_collector(agg.days_to_merge(), cfg, frequencies)?,
            days_open: DistributionSummary::from_collector(agg.days_open(), cfg, frequencies)?,
            days_to_close: DistributionSummary::from_collector(agg.days_to_close(), cfg, frequencies)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub user: UserRef,
    pub self_merged: u64,
    pub self_merged_percentage: Option<f64>,
    pub stats: RecordSummary,
}

impl UserSummary {
    fn from_group(group: &UserAggregate, cfg: &ReportConfig) -> Result<Self, StatsError> {
        Ok(Self {
            user: group.user().clone(),
            self_merged: group.self_merged(),
            self_merged_percentage: group.self_merged_percentage(),
            stats: RecordSummary::from_aggregator(group.stats(), cfg, false)?,
        })
    }
}

/// Population summary of one grouping: size, extremes (with ties) and mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub rank_by: RankBy,
    pub total_users: usize,
    pub max: Option<u64>,
    pub max_users: Vec<String>,
    pub min: Option<u64>,
    pub min_users: Vec<String>,
    pub average_per_user: Option<f64>,
}

impl GroupSummary {
    pub fn from_groups<T: Ranked>(groups: &[&T], by: RankBy) -> Self {
        let maxima = ranking::find_maxima(groups, by);
        let minima = ranking::find_minima(groups, by);
        let total: u64 = groups.iter().map(|g| g.rank_value(by)).sum();
        Self {
            rank_by: by,
            total_users: groups.len(),
            max: maxima.first().map(|g| g.rank_value(by)),
            max_users: maxima.iter().map(|g| g.rank_name().to_string()).collect(),
            min: minima.first().map(|g| g.rank_value(by)),
            min_users: minima.iter().map(|g| g.rank_name().to_string()).collect(),
            average_per_user: ranking::average_per_group(total, groups.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub overall: RecordSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_summary: Option<GroupSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_stats: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_summary: Option<GroupSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_stats: Vec<UserSummary>,
    pub unresolved_mergers: u64,
    /// Records left out of every count because they were inconsistent.
    pub skipped_records: u64,
}

impl StatsReport {
    /// Snapshots a finalized aggregator. Sections disabled in `cfg` are left
    /// out; detailed sections list groups by descending metric.
    pub fn build(
        source: impl Into<String>,
        agg: &GroupingAggregator,
        cfg: &ReportConfig,
    ) -> Result<Self, StatsError> {
        let overall = RecordSummary::from_aggregator(agg.overall(), cfg, true)?;
        let authors = agg.authors();
        let mergers = agg.merging_users();
        let sections = cfg.sections;

        let detail = |groups: &[&UserAggregate], by: RankBy| -> Result<Vec<UserSummary>, StatsError> {
            ranking::sorted_descending(groups, by)
                .into_iter()
                .map(|g| UserSummary::from_group(g, cfg))
                .collect()
        };

        Ok(Self {
            source: source.into(),
            generated_at: agg.overall().now(),
            overall,
            user_summary: sections
                .user_summary
                .then(|| GroupSummary::from_groups(&authors, RankBy::Total)),
            user_stats: if sections.user_stats {
                detail(authors.as_slice(), RankBy::Total)?
            } else {
                Vec::new()
            },
            merge_summary: sections
                .merge_summary
                .then(|| GroupSummary::from_groups(&mergers, RankBy::Merged)),
            merge_stats: if sections.merge_stats {
                detail(mergers.as_slice(), RankBy::Merged)?
            } else {
                Vec::new()
            },
            unresolved_mergers: agg.unresolved_mergers(),
            skipped_records: agg.skipped_records(),
        })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
