// =============================================================================
// Market Data — daily OHLCV bars loaded from per-ticker CSV files
// =============================================================================
//
// The on-disk convention is one CSV per ticker (`AAPL.csv`, `SPY.csv`, ...)
// with the standard download columns:
//
//   Date,Open,High,Low,Close,Volume
//
// An `Adj Close` column may be present and is ignored. Bars are validated on
// load: dates must be strictly increasing and every price must be finite and
// positive.

pub mod csv_store;

pub use csv_store::CsvStore;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single daily OHLCV bar.
/// CSV headers are lowercased before deserialization, so `Date`, `DATE`
/// and `date` all bind to these field names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// A bar is usable when every price is finite and positive and the range
    /// is not inverted.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.high >= self.low
    }
}

/// A validated, time-ordered series of daily bars for one ticker.
/// Not `Deserialize`: construction must go through `new()` so the ordering
/// and price invariants always hold.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pub ticker: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from raw bars, enforcing the load invariants.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self> {
        let ticker = ticker.into();
        if bars.is_empty() {
            bail!("{ticker}: no bars");
        }

        let mut prior: Option<NaiveDate> = None;
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_valid() {
                bail!("{ticker}: invalid bar at row {} ({})", i + 1, bar.date);
            }
            if let Some(prev) = prior {
                if bar.date <= prev {
                    bail!(
                        "{ticker}: date failed to increase at row {} ({} after {})",
                        i + 1,
                        bar.date,
                        prev
                    );
                }
            }
            prior = Some(bar.date);
        }

        Ok(Self { ticker, bars })
    }

    /// Load a series from a single ticker CSV file.
    pub fn from_csv_path(ticker: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let ticker = ticker.into();
        let path = path.as_ref();

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        // Normalize header casing so `Date`, `DATE` and `date` all work.
        let lowered: csv::StringRecord = reader
            .headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        reader.set_headers(lowered);

        let mut bars = Vec::new();
        for (i, record) in reader.deserialize::<Bar>().enumerate() {
            let bar = record
                .with_context(|| format!("{}: bad CSV row {}", path.display(), i + 2))?;
            bars.push(bar);
        }

        debug!(ticker = %ticker, rows = bars.len(), path = %path.display(), "loaded ticker CSV");
        Self::new(ticker, bars)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Natural-log closes — the flag detector and level finder both operate
    /// in log space so pattern geometry is scale-free.
    pub fn log_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close.ln()).collect()
    }

    pub fn last_close(&self) -> f64 {
        // Non-empty is a construction invariant.
        self.bars[self.bars.len() - 1].close
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}
