use crate::errors::StatsError;
use crate::lifecycle::Phase;
use crate::model::{elapsed_days, PullRequestRecord};
use crate::stats::NumericStatsCollector;
use chrono::{DateTime, Utc};

/// Counts records by lifecycle state and tracks the elapsed-day distributions.
///
/// `now` is the single reference instant for the age of open records; every
/// aggregator of one run must share it.
#[derive(Debug, Clone)]
pub struct RecordAggregator {
    now: DateTime<Utc>,
    phase: Phase,
    total: u64,
    open: u64,
    merged: u64,
    closed: u64,
    open_mergeable: u64,
    days_open: NumericStatsCollector,
    days_to_merge: NumericStatsCollector,
    days_to_close: NumericStatsCollector,
}

impl RecordAggregator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            phase: Phase::Fresh,
            total: 0,
            open: 0,
            merged: 0,
            closed: 0,
            open_mergeable: 0,
            days_open: NumericStatsCollector::new(),
            days_to_merge: NumericStatsCollector::new(),
            days_to_close: NumericStatsCollector::new(),
        }
    }

    pub fn start(&mut self) {
        self.total = 0;
        self.open = 0;
        self.merged = 0;
        self.closed = 0;
        self.open_mergeable = 0;
        self.days_open.start();
        self.days_to_merge.start();
        self.days_to_close.start();
        self.phase.start();
    }

    /// Classifies `pr` (merged, else closed, else open) and feeds the matching day collector.
    ///
    /// The sample is validated before any counter moves, so a rejected record
    /// leaves the aggregate untouched.
    pub fn collect(&mut self, pr: &PullRequestRecord) -> Result<(), StatsError> {
        self.phase.ensure_collecting("collect a pull request")?;

        if let Some(merged_at) = pr.merged_at {
            let days = checked_days(pr, elapsed_days(pr.created_at, merged_at))?;
            self.days_to_merge.collect(days)?;
            self.merged += 1;
        } else if let Some(closed_at) = pr.closed_at {
            let days = checked_days(pr, elapsed_days(pr.created_at, closed_at))?;
            self.days_to_close.collect(days)?;
            self.closed += 1;
        } else {
            let days = checked_days(pr, elapsed_days(pr.created_at, self.now))?;
            self.days_open.collect(days)?;
            self.open += 1;
            if pr.is_mergeable() {
                self.open_mergeable += 1;
            }
        }
        self.total += 1;
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), StatsError> {
        self.phase.end()?;
        self.days_open.end()?;
        self.days_to_merge.end()?;
        self.days_to_close.end()?;
        Ok(())
    }

    /// Sums counters and folds the day samples of `other` into this aggregate.
    pub fn merge(&mut self, other: &RecordAggregator) -> Result<(), StatsError> {
        self.phase.ensure_collecting("merge aggregates")?;
        self.days_open.merge(&other.days_open)?;
        self.days_to_merge.merge(&other.days_to_merge)?;
        self.days_to_close.merge(&other.days_to_close)?;
        self.total += other.total;
        self.open += other.open;
        self.merged += other.merged;
        self.closed += other.closed;
        self.open_mergeable += other.open_mergeable;
        Ok(())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn open(&self) -> u64 {
        self.open
    }

    pub fn merged(&self) -> u64 {
        self.merged
    }

    pub fn closed(&self) -> u64 {
        self.closed
    }

    pub fn open_mergeable(&self) -> u64 {
        self.open_mergeable
    }

    /// `None` when nothing has been collected.
    pub fn open_percentage(&self) -> Option<f64> {
        self.percentage(self.open)
    }

    pub fn merged_percentage(&self) -> Option<f64> {
        self.percentage(self.merged)
    }

    pub fn closed_percentage(&self) -> Option<f64> {
        self.percentage(self.closed)
    }

    /// `count / total` as a fraction; `None` for an empty aggregate.
    pub fn percentage(&self, count: u64) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(count as f64 / self.total as f64)
        }
    }

    pub fn days_open(&self) -> &NumericStatsCollector {
        &self.days_open
    }

    pub fn days_to_merge(&self) -> &NumericStatsCollector {
        &self.days_to_merge
    }

    pub fn days_to_close(&self) -> &NumericStatsCollector {
        &self.days_to_close
    }
}

fn checked_days(pr: &PullRequestRecord, days: i64) -> Result<i64, StatsError> {
    if days < 0 {
        return Err(StatsError::invalid_argument(format!(
            "PR #{} ends {} day(s) before it was created",
            pr.number, -days
        )));
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserRef;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn pr(number: u64) -> PullRequestRecord {
        PullRequestRecord {
            number,
            user: UserRef::new(1, "alice"),
            created_at: now() - Duration::days(10),
            merged_at: None,
            closed_at: None,
            merged_by: None,
            mergeable: None,
        }
    }

    fn started() -> RecordAggregator {
        let mut agg = RecordAggregator::new(now());
        agg.start();
        agg
    }

    #[test]
    fn test_end_to_end_three_states() {
        let mut agg = started();

        let mut open = pr(1);
        open.created_at = now() - Duration::days(5);
        open.mergeable = Some(true);

        let mut merged = pr(2);
        merged.merged_at = Some(merged.created_at + Duration::days(2));
        merged.closed_at = merged.merged_at;

        let mut closed = pr(3);
        closed.closed_at = Some(closed.created_at + Duration::days(3));

        for r in [&open, &merged, &closed] {
            agg.collect(r).unwrap();
        }
        agg.end().unwrap();

        assert_eq!(agg.total(), 3);
        assert_eq!(agg.open(), 1);
        assert_eq!(agg.merged(), 1);
        assert_eq!(agg.closed(), 1);
        assert_eq!(agg.open_mergeable(), 1);
        assert_eq!(agg.days_open().samples(), &[5]);
        assert_eq!(agg.days_to_merge().samples(), &[2]);
        assert_eq!(agg.days_to_close().samples(), &[3]);

        let pct = agg.merged_percentage().unwrap();
        assert!((pct - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(agg.days_to_merge().percentile(50.0).unwrap(), 2.0);
    }

    #[test]
    fn test_days_truncate() {
        let mut agg = started();
        let mut r = pr(1);
        r.merged_at = Some(r.created_at + Duration::hours(47));
        agg.collect(&r).unwrap();
        assert_eq!(agg.days_to_merge().samples(), &[1]);
    }

    #[test]
    fn test_mergeable_only_counts_open() {
        let mut agg = started();
        let mut r = pr(1);
        r.mergeable = Some(true);
        r.merged_at = Some(r.created_at + Duration::days(1));
        agg.collect(&r).unwrap();
        assert_eq!(agg.open_mergeable(), 0);
        assert_eq!(agg.merged(), 1);
    }

    #[test]
    fn test_counter_invariants() {
        let mut agg = started();
        for i in 0..12u64 {
            let mut r = pr(i);
            r.mergeable = Some(i % 2 == 0);
            match i % 3 {
                0 => r.merged_at = Some(r.created_at + Duration::days(i as i64 % 4)),
                1 => r.closed_at = Some(r.created_at + Duration::hours(i as i64 * 7)),
                _ => {}
            }
            agg.collect(&r).unwrap();
            assert_eq!(agg.total(), agg.open() + agg.merged() + agg.closed());
            assert!(agg.open_mergeable() <= agg.open());
        }
    }

    #[test]
    fn test_empty_percentages_are_none() {
        let agg = started();
        assert_eq!(agg.open_percentage(), None);
        assert_eq!(agg.merged_percentage(), None);
        assert_eq!(agg.closed_percentage(), None);
    }

    #[test]
    fn test_negative_duration_rejected_without_side_effects() {
        let mut agg = started();
        let mut r = pr(9);
        r.merged_at = Some(r.created_at - Duration::days(2));
        let err = agg.collect(&r).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("#9"));
        assert_eq!(agg.total(), 0);
        assert_eq!(agg.merged(), 0);
    }

    #[test]
    fn test_lifecycle() {
        let mut agg = RecordAggregator::new(now());
        assert!(agg.collect(&pr(1)).unwrap_err().is_invalid_state());
        agg.start();
        agg.collect(&pr(1)).unwrap();
        agg.end().unwrap();
        agg.end().unwrap();
        assert!(agg.collect(&pr(2)).unwrap_err().is_invalid_state());
        assert_eq!(agg.total(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = started();
        let mut b = started();
        a.collect(&pr(1)).unwrap();
        let mut m = pr(2);
        m.merged_at = Some(m.created_at + Duration::days(4));
        b.collect(&m).unwrap();
        b.end().unwrap();

        a.merge(&b).unwrap();
        a.end().unwrap();
        assert_eq!(a.total(), 2);
        assert_eq!(a.open(), 1);
        assert_eq!(a.merged(), 1);
        assert_eq!(a.days_to_merge().max(), Some(4));
    }
}
