use super::exit_codes;
use crate::cli::args::InitArgs;
use std::path::Path;

pub fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    write_sample_config_if_missing(&args.config)?;
    Ok(exit_codes::OK)
}

fn write_sample_config_if_missing(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        eprintln!("note: {} already exists (skipped)", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    prstats_core::config::write_sample_config(path, crate::templates::PRSTATS_YAML)
        .map_err(|e| anyhow::anyhow!(e))?;
    eprintln!("created {}", path.display());
    Ok(())
}
