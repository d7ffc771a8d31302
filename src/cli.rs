// =============================================================================
// Command-line Interface
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

use crate::config::ScanConfig;

/// Offline technical scanner for a directory of OHLCV CSV files.
#[derive(Debug, Parser)]
#[command(name = "ridgeline", version, about)]
pub struct Cli {
    /// Path to a JSON scan config (defaults are used when absent).
    #[arg(long, default_value = "scan_config.json")]
    pub config: PathBuf,

    /// Directory of TICKER.csv files (overrides the config).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output directory for signals.csv and summary.json (overrides the config).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Comma-separated ticker whitelist (overrides the config).
    #[arg(long, value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,

    /// Minimum fractional gap size, e.g. 0.001 (overrides the config).
    #[arg(long)]
    pub min_gap_pct: Option<f64>,
}

impl Cli {
    /// Fold CLI overrides into a loaded config.
    pub fn apply_to(&self, config: &mut ScanConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(out) = &self.out {
            config.report_dir = out.clone();
        }
        if let Some(tickers) = &self.tickers {
            config.tickers = tickers
                .iter()
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(pct) = self.min_gap_pct {
            config.min_gap_pct = pct;
        }
    }
}
