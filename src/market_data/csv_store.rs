// =============================================================================
// CsvStore — ticker discovery over a directory of per-ticker CSV files
// =============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use super::PriceSeries;

/// A discovered ticker file: the ticker is the uppercased file stem.
#[derive(Debug, Clone)]
pub struct TickerFile {
    pub ticker: String,
    pub path: PathBuf,
}

/// Read-only view over a directory of `TICKER.csv` files.
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Enumerate every `*.csv` file directly under the store root, sorted by
    /// ticker so scan output is deterministic.
    pub fn discover(&self) -> Result<Vec<TickerFile>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read data dir {}", self.root.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.context("failed to read data dir entry")?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            files.push(TickerFile {
                ticker: stem.to_uppercase(),
                path,
            });
        }

        files.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        info!(dir = %self.root.display(), tickers = files.len(), "discovered ticker files");
        Ok(files)
    }

    /// Load a discovered ticker file through its real path, so on-disk
    /// casing (`good.csv` vs `GOOD.csv`) never matters.
    pub fn load_file(&self, file: &TickerFile) -> Result<PriceSeries> {
        PriceSeries::from_csv_path(file.ticker.as_str(), &file.path)
    }

    /// Load a single ticker by name (`{root}/{ticker}.csv`).
    pub fn load(&self, ticker: &str) -> Result<PriceSeries> {
        let path = self.root.join(format!("{ticker}.csv"));
        PriceSeries::from_csv_path(ticker, path)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_csv(dir: &Path, name: &str) {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-02,10.0,11.0,9.0,10.5,100\n\
                    2024-01-03,10.5,12.0,10.0,11.5,200\n";
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn discover_finds_csvs_sorted_and_uppercased() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "msft.csv");
        write_csv(dir.path(), "AAPL.csv");
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let store = CsvStore::new(dir.path());
        let files = store.discover().unwrap();
        let tickers: Vec<&str> = files.iter().map(|f| f.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn discover_missing_dir_is_error() {
        let store = CsvStore::new("/nonexistent/ridgeline-data");
        assert!(store.discover().is_err());
    }

    #[test]
    fn load_file_honors_on_disk_casing() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "good.csv");

        let store = CsvStore::new(dir.path());
        let files = store.discover().unwrap();
        assert_eq!(files[0].ticker, "GOOD");

        // The uppercased name has no matching file, but the real path does.
        let series = store.load_file(&files[0]).unwrap();
        assert_eq!(series.ticker, "GOOD");
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn load_by_ticker() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "SPY.csv");
        let store = CsvStore::new(dir.path());
        let series = store.load("SPY").unwrap();
        assert_eq!(series.ticker, "SPY");
        assert_eq!(series.len(), 2);
    }
}
