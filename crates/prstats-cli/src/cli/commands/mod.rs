use super::args::*;
use prstats_core::config::EnvSettings;
use tracing_subscriber::{fmt, EnvFilter};

pub mod init;
pub mod report;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let env = EnvSettings::from_env();
    let level = cli.log_level.clone().unwrap_or_else(|| env.log_level.clone());
    init_logging(&level, cli.log_json);

    match cli.cmd {
        Command::Report(args) => report::cmd_report(args, &env).await,
        Command::Init(args) => init::cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn init_logging(log_level: &str, json: bool) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init();
    } else {
        builder.init();
    }
}
