use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Report configuration, usually loaded from `prstats.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub sections: Sections,
    /// Percentile ranks printed for the global day distributions
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    /// Day thresholds printed as "Under N days" cumulative percentages
    #[serde(default = "default_thresholds")]
    pub cumulative_thresholds: Vec<u64>,
    #[serde(default)]
    pub github: GithubSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    #[serde(default)]
    pub user_summary: bool,
    #[serde(default)]
    pub user_stats: bool,
    #[serde(default)]
    pub merge_summary: bool,
    #[serde(default)]
    pub merge_stats: bool,
}

impl Sections {
    pub fn all() -> Self {
        Self {
            user_summary: true,
            user_stats: true,
            merge_summary: true,
            merge_stats: true,
        }
    }

    pub fn needs_authors(&self) -> bool {
        self.user_summary || self.user_stats
    }

    pub fn needs_merging_users(&self) -> bool {
        self.merge_summary || self.merge_stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            per_page: default_per_page(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            sections: Sections::default(),
            percentiles: default_percentiles(),
            cumulative_thresholds: default_thresholds(),
            github: GithubSettings::default(),
        }
    }
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

fn default_percentiles() -> Vec<f64> {
    vec![25.0, 50.0, 75.0, 100.0]
}

fn default_thresholds() -> Vec<u64> {
    vec![7, 30, 90, 180, 365]
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_per_page() -> u32 {
    100
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if let Some(p) = self
            .percentiles
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(ConfigError(format!(
                "percentile {} is outside [0, 100]",
                p
            )));
        }
        if !(1..=100).contains(&self.github.per_page) {
            return Err(ConfigError(format!(
                "github.per_page must be within 1..=100 (got {})",
                self.github.per_page
            )));
        }
        Ok(())
    }
}

pub fn parse_config(raw: &str) -> Result<ReportConfig, ConfigError> {
    let cfg: ReportConfig = serde_yaml::from_str(raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<ReportConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw)
}

/// Loads `path` when it exists, otherwise falls back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<ReportConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(event = "config_missing", path = %path.display());
        Ok(ReportConfig::default())
    }
}

pub fn write_sample_config(path: &Path, contents: &str) -> Result<(), ConfigError> {
    parse_config(contents)?;
    std::fs::write(path, contents)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

/// Settings taken from the process environment.
#[derive(Clone)]
pub struct EnvSettings {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub log_level: String,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_url: None,
            log_level: "info".to_string(),
        }
    }
}

impl std::fmt::Debug for EnvSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSettings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl EnvSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `PRSTATS_TOKEN` wins over `GITHUB_TOKEN`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();
        cfg.token = get("PRSTATS_TOKEN").or_else(|| get("GITHUB_TOKEN"));
        cfg.api_url = get("PRSTATS_API_URL");
        if let Some(v) = get("PRSTATS_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}
