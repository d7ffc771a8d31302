// =============================================================================
// Ridgeline — Main Entry Point
// =============================================================================
//
// Offline technical scanner: reads a directory of OHLCV CSV files, runs the
// full detector suite over each ticker, and writes signals.csv plus
// summary.json into the report directory.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod cli;
mod config;
mod indicators;
mod levels;
mod market_data;
mod patterns;
mod report;
mod scanner;
mod types;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ScanConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ScanConfig::load(&cli.config).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        ScanConfig::default()
    });
    cli.apply_to(&mut config);

    info!(
        data_dir = %config.data_dir.display(),
        report_dir = %config.report_dir.display(),
        benchmark = %config.benchmark,
        "starting scan"
    );

    let outcome = scanner::scan_universe(&config)?;
    let summary = report::write_reports(&outcome, &config.report_dir)?;

    info!(
        scanned = summary.tickers_scanned,
        skipped = summary.tickers_skipped,
        "done"
    );
    Ok(())
}
