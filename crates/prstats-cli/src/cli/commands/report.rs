use super::exit_codes;
use crate::cli::args::ReportArgs;
use anyhow::Context;
use chrono::{DateTime, Utc};
use prstats_core::collectors::GroupingOptions;
use prstats_core::config::{self, EnvSettings, ReportConfig};
use prstats_core::engine::Runner;
use prstats_core::errors::ConfigError;
use prstats_core::providers::file::FileSource;
use prstats_core::providers::github::{GithubClient, GithubResolver, RateLimit};
use prstats_core::report::{console, StatsReport};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

pub async fn cmd_report(args: ReportArgs, env: &EnvSettings) -> anyhow::Result<i32> {
    let format = match args.format.as_str() {
        "text" => Format::Text,
        "json" => Format::Json,
        other => {
            eprintln!("config error: unknown --format '{}' (expected text|json)", other);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let now = match args.now.as_deref().map(parse_now).transpose() {
        Ok(now) => now.unwrap_or_else(Utc::now),
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let cfg = match effective_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let options = GroupingOptions {
        by_author: cfg.sections.needs_authors(),
        by_merging_user: cfg.sections.needs_merging_users(),
    };

    let agg = match &args.input {
        Some(path) => {
            tracing::info!(event = "report_start", input = %path.display(), now = %now);
            Runner::new(Arc::new(FileSource::new(path)), options, now)
                .run()
                .await?
        }
        None => {
            let client = Arc::new(github_client(&args, env, &cfg)?);
            tracing::info!(
                event = "report_start",
                repository = %format!("{}/{}", args.owner, args.repo),
                authenticated = client.token.is_some(),
                now = %now
            );
            let before = quota(&client).await;

            let resolver = GithubResolver::new(client.clone())?;
            let agg = Runner::new(client.clone(), options, now)
                .with_resolver(Arc::new(resolver))
                .run()
                .await?;

            log_quota_used(before, client.rate_limit());
            agg
        }
    };

    let source = format!("{}/{}", args.owner, args.repo);
    let report = StatsReport::build(source, &agg, &cfg)?;
    let rendered = match format {
        Format::Text => console::render_text(&report),
        Format::Json => report.to_json()?,
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(exit_codes::OK)
}

fn parse_now(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid --now '{}' (expected RFC 3339)", raw))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Config file (or defaults) with the section flags layered on top.
fn effective_config(args: &ReportArgs) -> Result<ReportConfig, ConfigError> {
    let mut cfg = config::load_config_or_default(&args.config)?;
    if args.all {
        cfg.sections = config::Sections::all();
    } else {
        cfg.sections.user_summary |= args.user_summary;
        cfg.sections.user_stats |= args.user_stats;
        cfg.sections.merge_summary |= args.merge_summary;
        cfg.sections.merge_stats |= args.merge_stats;
    }
    if let Some(per_page) = args.per_page {
        cfg.github.per_page = per_page;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn github_client(
    args: &ReportArgs,
    env: &EnvSettings,
    cfg: &ReportConfig,
) -> anyhow::Result<GithubClient> {
    let api_url = args
        .api_url
        .clone()
        .or_else(|| env.api_url.clone())
        .unwrap_or_else(|| cfg.github.api_url.clone());
    let token = args.token.clone().or_else(|| env.token.clone());
    if token.is_none() {
        tracing::warn!(
            event = "unauthenticated",
            "No GitHub token configured; unauthenticated requests are heavily rate limited"
        );
    }

    Ok(GithubClient::new(&args.owner, &args.repo)?
        .with_api_url(api_url)
        .with_token(token)
        .with_per_page(cfg.github.per_page))
}

async fn quota(client: &GithubClient) -> Option<RateLimit> {
    match client.refresh_rate_limit().await {
        Ok(Some(rl)) => {
            tracing::info!(
                event = "rate_limit",
                remaining = rl.remaining,
                limit = rl.limit,
                "You have {} GitHub API requests of {} remaining",
                rl.remaining,
                rl.limit
            );
            Some(rl)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(event = "rate_limit_unavailable", error = %e);
            None
        }
    }
}

fn log_quota_used(before: Option<RateLimit>, after: Option<RateLimit>) {
    let Some(after) = after else {
        return;
    };
    tracing::info!(
        event = "rate_limit",
        remaining = after.remaining,
        limit = after.limit,
        "You have {} GitHub API requests of {} remaining",
        after.remaining,
        after.limit
    );
    if let Some(before) = before {
        let used = before.remaining.saturating_sub(after.remaining);
        tracing::info!(
            event = "rate_limit_used",
            used,
            "Generating statistics used {} GitHub API requests",
            used
        );
    }
}
