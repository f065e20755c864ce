//! Glacier batch restore tool
//!
//! Restores archived S3 objects in bulk and reports their restore status.

// glacier-restore/src/main.rs
mod config;
mod errors;
mod listing;
mod restore;
mod status;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Args, RunConfig};
use std::process::ExitCode;
use storage::S3ObjectStore;
use tracing_subscriber::EnvFilter;
use utils::Console;
use utils::prompt::StdinPrompt;

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    match run_app(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_app(args: Args) -> Result<()> {
    let config = RunConfig::from_args(args).context("Invalid arguments")?;
    tracing::debug!("Run configuration: {:?}", config);

    let store = S3ObjectStore::connect(&config.remote).await;
    let console = Console::stdout();
    let mut prompt = StdinPrompt;

    let report = restore::run_restore_flow(&store, &config, &mut prompt, &console)
        .await
        .context("Restore run failed")?;
    tracing::info!("Run finished: {:?}", report.outcome);

    if report.failures > 0 {
        anyhow::bail!("{} objects failed; re-run to retry them", report.failures);
    }
    Ok(())
}
