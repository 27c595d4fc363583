use crate::collectors::{GroupingAggregator, GroupingOptions};
use crate::errors::StatsError;
use crate::model::PullRequestRecord;
use crate::providers::{MergedByResolver, NoResolver, PullRequestSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Drives one aggregation run: fetch everything, then feed the records to a
/// fresh aggregator in source order and finalize it.
pub struct Runner {
    pub source: Arc<dyn PullRequestSource>,
    pub resolver: Arc<dyn MergedByResolver + Send + Sync>,
    pub options: GroupingOptions,
    pub now: DateTime<Utc>,
}

impl Runner {
    pub fn new(source: Arc<dyn PullRequestSource>, options: GroupingOptions, now: DateTime<Utc>) -> Self {
        Self {
            source,
            resolver: Arc::new(NoResolver),
            options,
            now,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn MergedByResolver + Send + Sync>) -> Self {
        self.resolver = resolver;
        self
    }

    pub async fn run(&self) -> anyhow::Result<GroupingAggregator> {
        let name = self.source.source_name();
        tracing::info!(event = "fetch_started", source = %name, "Fetching pull requests from {}", name);
        let records = self.source.fetch_pull_requests().await?;
        tracing::info!(
            event = "fetch_finished",
            source = %name,
            records = records.len(),
            "Fetched {} pull requests",
            records.len()
        );
        Ok(self.aggregate(&records)?)
    }

    pub fn aggregate(&self, records: &[PullRequestRecord]) -> Result<GroupingAggregator, StatsError> {
        let mut agg = GroupingAggregator::new(self.options, self.now);
        agg.start();
        for pr in records {
            match agg.collect(pr, self.resolver.as_ref()) {
                Ok(()) => {
                    tracing::debug!(event = "record_collected", pr = pr.number, state = ?pr.state());
                }
                // an inconsistent record is dropped, the rest of the run survives
                Err(e) if e.is_invalid_argument() => {
                    agg.record_skipped();
                    tracing::warn!(
                        event = "record_skipped",
                        pr = pr.number,
                        error = %e,
                        "Skipping PR #{}: {}",
                        pr.number,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        agg.end()?;

        tracing::info!(
            event = "aggregation_finished",
            total = agg.overall().total(),
            authors = agg.total_authors(),
            merging_users = agg.total_merging_users(),
            unresolved_mergers = agg.unresolved_mergers(),
            skipped = agg.skipped_records()
        );
        Ok(agg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserRef;
    use crate::providers::file::MemorySource;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn record(number: u64, author: &UserRef, created_days_ago: i64) -> PullRequestRecord {
        PullRequestRecord {
            number,
            user: author.clone(),
            created_at: now() - Duration::days(created_days_ago),
            merged_at: None,
            closed_at: None,
            merged_by: None,
            mergeable: None,
        }
    }

    #[tokio::test]
    async fn test_run_over_memory_source() {
        let alice = UserRef::new(1, "alice");
        let bob = UserRef::new(2, "bob");
        let mut merged = record(2, &bob, 10);
        merged.merged_at = Some(merged.created_at + Duration::days(4));
        merged.closed_at = merged.merged_at;
        merged.merged_by = Some(alice.clone());

        let source = MemorySource {
            records: vec![record(1, &alice, 5), merged],
        };
        let runner = Runner::new(Arc::new(source), GroupingOptions::all(), now());
        let agg = runner.run().await.unwrap();

        assert_eq!(agg.overall().total(), 2);
        assert_eq!(agg.overall().days_open().samples(), &[5]);
        assert_eq!(agg.overall().days_to_merge().samples(), &[4]);
        assert_eq!(agg.total_authors(), 2);
        assert_eq!(agg.merging_user(1).unwrap().merged(), 1);
    }

    #[test]
    fn test_invalid_record_is_skipped() {
        let alice = UserRef::new(1, "alice");
        let mut bad = record(1, &alice, 2);
        bad.closed_at = Some(bad.created_at - Duration::days(3));
        // created after the reference time
        let future = record(2, &alice, -3);

        let runner = Runner::new(Arc::new(MemorySource::default()), GroupingOptions::all(), now());
        let agg = runner
            .aggregate(&[record(3, &alice, 4), bad, future, record(4, &alice, 1)])
            .unwrap();

        assert_eq!(agg.skipped_records(), 2);
        assert_eq!(agg.overall().total(), 2);
        assert_eq!(agg.overall().days_open().samples(), &[4, 1]);
        assert_eq!(agg.author(1).unwrap().total(), 2);
    }
}
