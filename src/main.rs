//! dxfcheck harness: converts every fixture through all enabled pipelines and
//! writes the side-by-side comparison report.
//!
//! Takes no arguments. Settings come from `config/default.toml`, the file
//! named by `DXFCHECK_CONFIG`, and `DXFCHECK__*` environment variables.

use dxfcheck_converter::{Harness, RunSummary};
use dxfcheck_core::config::AppConfig;
use dxfcheck_core::AppResult;
use dxfcheck_core::logging;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&config.logging);

    match run(&config).await {
        Ok(summary) => {
            println!(
                "Converted {} fixture(s) in {} ms; report: {}",
                summary.fixtures.len(),
                summary.elapsed_ms,
                summary.report_path.display()
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Harness run failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(config: &AppConfig) -> AppResult<RunSummary> {
    let harness = Harness::from_config(config)?;
    tracing::info!(
        fixtures_dir = %harness.fixtures_dir().display(),
        report = %harness.report_path().display(),
        "Starting harness run"
    );
    Ok(harness.run().await?)
}
