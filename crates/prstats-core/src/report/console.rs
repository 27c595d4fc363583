use super::{DistributionSummary, GroupSummary, RecordSummary, StatsReport, UserSummary};
use std::io::{self, Write};

const DAYS_TO_MERGE: &str = "Days to Merge";
const DAYS_OPEN: &str = "Days Open";
const DAYS_TO_CLOSE: &str = "Days to Close";

pub fn render_text(report: &StatsReport) -> String {
    let mut buf = Vec::new();
    // writing into a Vec<u8> cannot fail
    let _ = write_report(report, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn write_report<W: Write>(report: &StatsReport, w: &mut W) -> io::Result<()> {
    write_basic(&report.overall, w)?;
    if report.skipped_records > 0 {
        writeln!(w, "Skipped Pull Requests: {}", report.skipped_records)?;
    }
    writeln!(w)?;

    for (dist, metric) in [
        (&report.overall.days_to_merge, DAYS_TO_MERGE),
        (&report.overall.days_open, DAYS_OPEN),
        (&report.overall.days_to_close, DAYS_TO_CLOSE),
    ] {
        write_distribution(dist, metric, w)?;
        writeln!(w)?;
    }

    if let Some(summary) = &report.user_summary {
        writeln!(w, "Total Users: {}", summary.total_users)?;
        write_group_summary(summary, "Pull Requests by User", "Pull Requests per User", w)?;
        writeln!(w)?;
    }
    for user in &report.user_stats {
        write_user(user, w)?;
        writeln!(w)?;
    }

    if let Some(summary) = &report.merge_summary {
        writeln!(w, "Total Merging Users: {}", summary.total_users)?;
        write_group_summary(
            summary,
            "Pull Requests Merged by User",
            "Pull Requests Merged per User",
            w,
        )?;
        if report.unresolved_mergers > 0 {
            writeln!(
                w,
                "Merged Pull Requests with Unknown Merging User: {}",
                report.unresolved_mergers
            )?;
        }
        writeln!(w)?;
    }
    for user in &report.merge_stats {
        write_user(user, w)?;
        writeln!(w)?;
    }
    Ok(())
}

fn write_basic<W: Write>(s: &RecordSummary, w: &mut W) -> io::Result<()> {
    if s.total == 0 {
        return Ok(());
    }
    writeln!(w, "Total Pull Requests: {}", s.total)?;
    if s.merged > 0 {
        writeln!(w, "Merged Pull Requests: {}", s.merged)?;
    }
    if s.open > 0 {
        writeln!(w, "Open Pull Requests: {}", s.open)?;
        writeln!(w, "Open Mergeable Pull Requests: {}", s.open_mergeable)?;
    }
    if s.closed > 0 {
        writeln!(w, "Closed Pull Requests: {}", s.closed)?;
    }
    if s.merged > 0 {
        write_percentage(s.merged_percentage, "Merged Pull Requests", w)?;
    }
    if s.open > 0 {
        write_percentage(s.open_percentage, "Open Pull Requests", w)?;
    }
    if s.closed > 0 {
        write_percentage(s.closed_percentage, "Closed Pull Requests", w)?;
    }
    Ok(())
}

fn write_percentage<W: Write>(fraction: Option<f64>, metric: &str, w: &mut W) -> io::Result<()> {
    writeln!(w, "Percentage {}: {}%", metric, whole_percent(fraction))
}

/// Integer percent, truncated.
fn whole_percent(fraction: Option<f64>) -> i64 {
    (fraction.unwrap_or(0.0) * 100.0) as i64
}

fn write_distribution<W: Write>(d: &DistributionSummary, metric: &str, w: &mut W) -> io::Result<()> {
    let (Some(min), Some(max), Some(mean), Some(gmean)) = (d.min, d.max, d.mean, d.geometric_mean)
    else {
        return Ok(());
    };
    writeln!(w, "Minimum {}: {}", metric, min)?;
    writeln!(w, "Maximum {}: {}", metric, max)?;
    writeln!(w, "Average (Arithmetic Mean) {}: {}", metric, mean as u64)?;
    writeln!(w, "Average (Geometric Mean) {}: {}", metric, gmean as u64)?;

    if d.percentiles.is_empty() && d.thresholds.is_empty() {
        return Ok(());
    }
    if !d.modes.is_empty() {
        let modes: Vec<String> = d.modes.iter().map(|m| m.to_string()).collect();
        writeln!(w, "Most Popular {}: {}", metric, modes.join(","))?;
    }
    writeln!(w, "Cumulative Frequency:")?;
    for p in &d.percentiles {
        writeln!(
            w,
            "  {}% ({} {}): {}",
            p.rank,
            p.value as u64,
            metric,
            p.cumulative_frequency
        )?;
    }
    for t in &d.thresholds {
        writeln!(
            w,
            "Under {} {}: {}%",
            t.days,
            metric,
            whole_percent(Some(t.cumulative_percentage))
        )?;
    }
    Ok(())
}

fn write_group_summary<W: Write>(
    s: &GroupSummary,
    extreme_label: &str,
    average_label: &str,
    w: &mut W,
) -> io::Result<()> {
    let (Some(max), Some(min)) = (s.max, s.min) else {
        return Ok(());
    };
    writeln!(w, "Max {}: {} [{}]", extreme_label, max, s.max_users.join(", "))?;
    writeln!(w, "Min {}: {} [{}]", extreme_label, min, s.min_users.join(", "))?;
    if let Some(avg) = s.average_per_user {
        writeln!(w, "Average {}: {}", average_label, avg as u64)?;
    }
    Ok(())
}

fn write_user<W: Write>(u: &UserSummary, w: &mut W) -> io::Result<()> {
    writeln!(w, "{}", u.user.login)?;
    write_basic(&u.stats, w)?;
    write_percentage(u.self_merged_percentage, "Self Merged Pull Requests", w)?;
    write_distribution(&u.stats.days_to_merge, DAYS_TO_MERGE, w)?;
    write_distribution(&u.stats.days_open, DAYS_OPEN, w)?;
    write_distribution(&u.stats.days_to_close, DAYS_TO_CLOSE, w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{GroupingAggregator, GroupingOptions};
    use crate::config::{ReportConfig, Sections};
    use crate::model::{PullRequestRecord, UserRef};
    use crate::providers::NoResolver;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn sample_report(sections: Sections) -> StatsReport {
        let alice = UserRef::new(1, "alice");
        let bob = UserRef::new(2, "bob");
        let open = PullRequestRecord {
            number: 1,
            user: alice.clone(),
            created_at: now() - Duration::days(5),
            merged_at: None,
            closed_at: None,
            merged_by: None,
            mergeable: Some(true),
        };
        let created = now() - Duration::days(20);
        let merged = PullRequestRecord {
            number: 2,
            user: bob.clone(),
            created_at: created,
            merged_at: Some(created + Duration::days(2)),
            closed_at: Some(created + Duration::days(2)),
            merged_by: Some(bob.clone()),
            mergeable: None,
        };
        let closed = PullRequestRecord {
            number: 3,
            user: alice.clone(),
            created_at: created,
            merged_at: None,
            closed_at: Some(created + Duration::days(3)),
            merged_by: None,
            mergeable: Some(true),
        };

        let mut agg = GroupingAggregator::new(GroupingOptions::all(), now());
        agg.start();
        for r in [open, merged, closed] {
            agg.collect(&r, &NoResolver).unwrap();
        }
        agg.end().unwrap();

        let cfg = ReportConfig {
            sections,
            ..ReportConfig::default()
        };
        StatsReport::build("octo/repo", &agg, &cfg).unwrap()
    }

    #[test]
    fn test_basic_layout() {
        let text = render_text(&sample_report(Sections::default()));
        assert!(text.starts_with("Total Pull Requests: 3\n"));
        assert!(text.contains("Open Mergeable Pull Requests: 1\n"));
        assert!(text.contains("Percentage Merged Pull Requests: 33%\n"));
        assert!(text.contains("Most Popular Days to Merge: 2\n"));
        assert!(text.contains("  50% (2 Days to Merge): 1\n"));
        assert!(text.contains("Under 7 Days Open: 100%\n"));
        assert!(text.contains("Minimum Days to Close: 3\n"));
        assert!(!text.contains("Total Users"));
        assert!(!text.contains("Skipped"));

        let mut report = sample_report(Sections::default());
        report.skipped_records = 2;
        let text = render_text(&report);
        assert!(text.contains("Percentage Closed Pull Requests: 33%\nSkipped Pull Requests: 2\n\n"));
    }

    #[test]
    fn test_user_sections() {
        let text = render_text(&sample_report(Sections::all()));
        assert!(text.contains("Total Users: 2\n"));
        assert!(text.contains("Max Pull Requests by User: 2 [alice]\n"));
        assert!(text.contains("Min Pull Requests by User: 1 [bob]\n"));
        assert!(text.contains("Average Pull Requests per User: 1\n"));
        assert!(text.contains("Total Merging Users: 1\n"));
        assert!(text.contains("Max Pull Requests Merged by User: 1 [bob]\n"));
        assert!(text.contains("bob\nTotal Pull Requests: 1\n"));
        assert!(text.contains("Percentage Self Merged Pull Requests: 100%\n"));
        // detailed sections carry no frequency data
        assert_eq!(text.matches("Cumulative Frequency:").count(), 3);
    }

    #[test]
    fn test_empty_report() {
        let mut agg = GroupingAggregator::new(GroupingOptions::default(), now());
        agg.start();
        agg.end().unwrap();
        let report = StatsReport::build("empty", &agg, &ReportConfig::default()).unwrap();
        assert!(!render_text(&report).contains("Total Pull Requests"));
    }
}
