#![doc = include_str!("../README.md")]

mod app;

use app::config::{AppConfig, CliArgs};
use app::telemetry::init_telemetry;
use app::{LogProgress, WorkbookSource};
use clap::Parser;

// Using mimalloc for lower contention between render workers, especially in
// musl environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Log render progress once per this many labels.
const PROGRESS_STEP: usize = 25;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let mut source = WorkbookSource::new(&config.input);
    let mut progress = LogProgress::every(PROGRESS_STEP);
    let summary = app::generate(&config, &mut source, &mut progress)?;

    println!("{}", summary.output.display());
    Ok(())
}

fn log_startup_info(config: &AppConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Generating labels from {} with full config: {:#?}",
            config.input.display(),
            config
        );
    } else {
        tracing::info!(
            "Generating labels from {} with {} workers",
            config.input.display(),
            config.num_workers
        );
    }
}
