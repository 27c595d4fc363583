use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prstats",
    version,
    about = "Generates pull request statistics for a GitHub repository"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// log filter, e.g. info or prstats_core=debug (default: $PRSTATS_LOG or info)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch pull requests and print statistics
    Report(ReportArgs),
    /// Write a sample prstats.yaml
    Init(InitArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct ReportArgs {
    /// repository owner
    pub owner: String,
    /// repository name
    pub repo: String,

    /// GitHub token (default: $PRSTATS_TOKEN or $GITHUB_TOKEN)
    #[arg(long, alias = "oauth")]
    pub token: Option<String>,

    /// read pull requests from an exported JSON array instead of the API
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long, default_value = "prstats.yaml")]
    pub config: PathBuf,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json

    /// write the report here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// reference instant for open pull request ages (RFC 3339, default: now)
    #[arg(long)]
    pub now: Option<String>,

    /// include every optional section
    #[arg(short = 'a', long)]
    pub all: bool,

    #[arg(long)]
    pub user_summary: bool,

    #[arg(long)]
    pub user_stats: bool,

    /// summary of who merges the pull requests
    #[arg(long)]
    pub merge_summary: bool,

    #[arg(long)]
    pub merge_stats: bool,

    #[arg(long)]
    pub per_page: Option<u32>,

    /// API base URL (default: $PRSTATS_API_URL or the config file)
    #[arg(long)]
    pub api_url: Option<String>,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "prstats.yaml")]
    pub config: PathBuf,
}
