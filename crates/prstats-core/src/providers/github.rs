use super::{MergedByResolver, PullRequestSource};
use crate::config::DEFAULT_API_URL;
use crate::model::{PullRequestRecord, UserRef};
use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Request quota reported by the API on the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimit {
    pub remaining: u64,
    pub limit: u64,
}

impl RateLimit {
    pub fn used(&self) -> u64 {
        self.limit.saturating_sub(self.remaining)
    }

    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        Some(Self {
            remaining: read("x-ratelimit-remaining")?,
            limit: read("x-ratelimit-limit")?,
        })
    }
}

/// GitHub REST v3 client for the pull requests of one repository.
pub struct GithubClient {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    pub per_page: u32,
    client: reqwest::Client,
    next_link: Regex,
    rate_limit: Mutex<Option<RateLimit>>,
}

impl GithubClient {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_url: DEFAULT_API_URL.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: None,
            per_page: 100,
            client,
            next_link: next_link_pattern()?,
            rate_limit: Mutex::new(None),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Quota seen on the last response, if the API reported one.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        *self.rate_limit.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queries `/rate_limit`, which does not count against the quota.
    pub async fn refresh_rate_limit(&self) -> anyhow::Result<Option<RateLimit>> {
        let url = format!("{}/rate_limit", self.api_url);
        self.get(&url).await?;
        Ok(self.rate_limit())
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.owner, self.repo)
    }

    async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let mut req = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("prstats/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        if let Some(rl) = RateLimit::from_headers(resp.headers()) {
            *self.rate_limit.lock().unwrap_or_else(|e| e.into_inner()) = Some(rl);
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API error ({}) for {}: {}", status, url, error_text);
        }
        Ok(resp)
    }

    /// Single pull request detail; unlike the list endpoint it carries
    /// `merged_by` and `mergeable`.
    pub async fn fetch_pull_request(&self, number: u64) -> anyhow::Result<PullRequestRecord> {
        let url = format!("{}/pulls/{}", self.repo_url(), number);
        let resp = self.get(&url).await?;
        resp.json::<PullRequestRecord>()
            .await
            .with_context(|| format!("failed to decode PR #{}", number))
    }

    fn next_page(&self, headers: &HeaderMap) -> Option<String> {
        let link = headers.get(LINK)?.to_str().ok()?;
        parse_next_link(&self.next_link, link)
    }
}

fn next_link_pattern() -> anyhow::Result<Regex> {
    Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).context("invalid Link header pattern")
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
pub fn parse_next_link(pattern: &Regex, header: &str) -> Option<String> {
    header
        .split(',')
        .find_map(|part| pattern.captures(part.trim()))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl PullRequestSource for GithubClient {
    async fn fetch_pull_requests(&self) -> anyhow::Result<Vec<PullRequestRecord>> {
        let mut url = Some(format!(
            "{}/pulls?state=all&per_page={}",
            self.repo_url(),
            self.per_page
        ));
        let mut records = Vec::new();
        let mut page = 0u32;

        while let Some(current) = url.take() {
            page += 1;
            let resp = self.get(&current).await?;
            url = self.next_page(resp.headers());
            let batch: Vec<PullRequestRecord> = resp
                .json()
                .await
                .with_context(|| format!("failed to decode page {} of pull requests", page))?;
            tracing::info!(
                event = "page_fetched",
                page,
                records = batch.len(),
                "Fetched page {} of pull requests",
                page
            );
            records.extend(batch);
        }
        Ok(records)
    }

    fn source_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Resolves missing merging identities with a per-record detail request.
///
/// Must run inside a multi-threaded tokio runtime.
pub struct GithubResolver {
    client: Arc<GithubClient>,
    handle: tokio::runtime::Handle,
}

impl GithubResolver {
    pub fn new(client: Arc<GithubClient>) -> anyhow::Result<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .context("GitHub resolver requires a tokio runtime")?;
        Ok(Self { client, handle })
    }
}

impl MergedByResolver for GithubResolver {
    fn resolve_merged_by(&self, pr: &PullRequestRecord) -> anyhow::Result<Option<UserRef>> {
        tracing::debug!(event = "merging_user_lookup", pr = pr.number);
        let detail = tokio::task::block_in_place(|| {
            self.handle
                .block_on(self.client.fetch_pull_request(pr.number))
        })?;
        Ok(detail.merged_by)
    }
}
