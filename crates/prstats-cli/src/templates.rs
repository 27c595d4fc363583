pub const PRSTATS_YAML: &str = r#"# prstats report configuration
version: 1

# Sections printed after the repository-wide statistics.
# Each one can also be switched on with the matching CLI flag, or all at once with --all.
sections:
  user_summary: false
  user_stats: false
  merge_summary: false
  merge_stats: false

# Percentile ranks printed under "Cumulative Frequency"
percentiles: [25, 50, 75, 100]

# "Under N days" cumulative percentages
cumulative_thresholds: [7, 30, 90, 180, 365]

github:
  api_url: "https://api.github.com"
  per_page: 100
"#;
