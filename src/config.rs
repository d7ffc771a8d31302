// =============================================================================
// Scan Configuration — Tunable scanner settings with atomic save
// =============================================================================
//
// Central configuration hub for the Ridgeline scanner.  Every tunable
// parameter lives here so a run can be reproduced from a single JSON file.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::levels::LevelParams;
use crate::patterns::ChannelParams;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_benchmark() -> String {
    "SPY".to_string()
}

fn default_min_gap_pct() -> f64 {
    0.001
}

fn default_gap_window() -> usize {
    5
}

fn default_flag_order() -> usize {
    12
}

fn default_hull_fast() -> usize {
    5
}

fn default_hull_slow() -> usize {
    34
}

fn default_confirm_window() -> usize {
    5
}

fn default_pivot_window() -> usize {
    90
}

fn default_min_bars() -> usize {
    60
}

// =============================================================================
// ScanConfig
// =============================================================================

/// Top-level configuration for a scan run.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    // --- Paths ---------------------------------------------------------------

    /// Directory containing one OHLCV CSV file per ticker.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory where signals.csv and summary.json are written.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    // --- Universe ------------------------------------------------------------

    /// Benchmark ticker whose returns feed the beta calculation.
    #[serde(default = "default_benchmark")]
    pub benchmark: String,

    /// Explicit ticker list; empty means every CSV in `data_dir`.
    #[serde(default)]
    pub tickers: Vec<String>,

    /// Minimum bars required before a ticker is scanned at all.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,

    // --- Detector parameters -------------------------------------------------

    /// Minimum fractional gap size (0.001 = 0.1 %).
    #[serde(default = "default_min_gap_pct")]
    pub min_gap_pct: f64,

    /// Trailing sessions checked for fresh gaps.
    #[serde(default = "default_gap_window")]
    pub gap_window: usize,

    /// Local-extrema order for flag/pennant detection (>= 3).
    #[serde(default = "default_flag_order")]
    pub flag_order: usize,

    /// Fast Hull MA period.
    #[serde(default = "default_hull_fast")]
    pub hull_fast: usize,

    /// Slow Hull MA period.
    #[serde(default = "default_hull_slow")]
    pub hull_slow: usize,

    /// Trailing bars in which a Hull crossover counts as current.
    #[serde(default = "default_confirm_window")]
    pub confirm_window: usize,

    /// Bars in the pivot/Fibonacci ladder window.
    #[serde(default = "default_pivot_window")]
    pub pivot_window: usize,

    /// Support/resistance level-finder parameters.
    #[serde(default)]
    pub level_params: LevelParams,

    /// Regression channel search parameters.
    #[serde(default)]
    pub channel_params: ChannelParams,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            report_dir: default_report_dir(),
            benchmark: default_benchmark(),
            tickers: Vec::new(),
            min_bars: default_min_bars(),
            min_gap_pct: default_min_gap_pct(),
            gap_window: default_gap_window(),
            flag_order: default_flag_order(),
            hull_fast: default_hull_fast(),
            hull_slow: default_hull_slow(),
            confirm_window: default_confirm_window(),
            pivot_window: default_pivot_window(),
            level_params: LevelParams::default(),
            channel_params: ChannelParams::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scan config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scan config from {}", path.display()))?;

        info!(
            path = %path.display(),
            data_dir = %config.data_dir.display(),
            benchmark = %config.benchmark,
            "scan config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise scan config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "scan config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.benchmark, "SPY");
        assert!(cfg.tickers.is_empty());
        assert_eq!(cfg.hull_fast, 5);
        assert_eq!(cfg.hull_slow, 34);
        assert_eq!(cfg.confirm_window, 5);
        assert_eq!(cfg.pivot_window, 90);
        assert_eq!(cfg.flag_order, 12);
        assert!((cfg.min_gap_pct - 0.001).abs() < f64::EPSILON);
        assert_eq!(cfg.level_params.lookback, 75);
        assert_eq!(cfg.channel_params.min_lookback, 60);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ScanConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.benchmark, "SPY");
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.min_bars, 60);
        assert_eq!(cfg.gap_window, 5);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "benchmark": "QQQ", "tickers": ["AAPL", "MSFT"] }"#;
        let cfg: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.benchmark, "QQQ");
        assert_eq!(cfg.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.hull_slow, 34);
        assert_eq!(cfg.level_params.max_levels, 12);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = ScanConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: ScanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.benchmark, cfg2.benchmark);
        assert_eq!(cfg.pivot_window, cfg2.pivot_window);
        assert_eq!(cfg.level_params.lookback, cfg2.level_params.lookback);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_config.json");

        let mut cfg = ScanConfig::default();
        cfg.benchmark = "IWM".to_string();
        cfg.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded.benchmark, "IWM");
        assert_eq!(loaded.hull_fast, cfg.hull_fast);
    }
}
