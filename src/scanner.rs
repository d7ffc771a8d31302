// =============================================================================
// Scanner — Per-ticker analysis and universe orchestration
// =============================================================================
//
// `scan_ticker` runs every detector over one price series and folds the
// results into a `TickerReport`. `scan_universe` discovers the CSV universe,
// loads the benchmark first for beta, then fans the per-ticker work out
// across a rayon thread pool. A ticker that fails to load or is too short
// is logged and skipped; one bad file never aborts the run.
// =============================================================================

use anyhow::Result;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::indicators::atr;
use crate::indicators::hull::{confirmed_crossovers, HullCrossover};
use crate::indicators::pivots::window_levels;
use crate::indicators::volatility;
use crate::levels::{penetration_signal, rolling_levels};
use crate::market_data::{CsvStore, PriceSeries};
use crate::patterns::{find_dynamic_channel, find_flags_pennants, recent_gaps};
use crate::patterns::{Channel, FlagPattern, Gap};
use crate::types::PriceLevel;

/// Channels wider than this (percent) are noise, not structure.
const MAX_CHANNEL_WIDTH_PCT: f64 = 50.0;

/// Everything the scanner learned about one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub last_date: NaiveDate,
    pub last_close: f64,

    // --- Risk metrics --------------------------------------------------------
    pub atr: Option<f64>,
    pub atr_pct: Option<f64>,
    pub annualized_vol: Option<f64>,
    pub beta: Option<f64>,
    pub percent_change: Option<f64>,

    // --- Event detectors -----------------------------------------------------
    pub crossovers: Vec<HullCrossover>,
    pub recent_gaps: Vec<Gap>,

    // --- Flag / pennant counts over the full history -------------------------
    pub bull_flags: usize,
    pub bear_flags: usize,
    pub bull_pennants: usize,
    pub bear_pennants: usize,
    pub latest_pattern: Option<FlagPattern>,

    // --- Price structure -----------------------------------------------------
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    /// Current level-penetration state: +1, −1, or 0 before any crossing.
    pub sr_signal: i32,
    pub pivot_levels: Vec<PriceLevel>,
    pub channel: Option<Channel>,
}

/// Outcome of a full universe scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub reports: Vec<TickerReport>,
    pub skipped: usize,
}

/// Run every detector over one series.
///
/// `benchmark_returns` are the benchmark's daily returns when its CSV was
/// available; beta is `None` without them.
pub fn scan_ticker(
    series: &PriceSeries,
    benchmark_returns: Option<&[f64]>,
    config: &ScanConfig,
) -> TickerReport {
    let bars = series.bars();
    let closes = series.closes();
    let last_close = series.last_close();

    let returns = volatility::daily_returns(&closes);
    let beta = benchmark_returns.and_then(|bench| volatility::beta(&returns, bench));

    let crossovers = confirmed_crossovers(
        bars,
        config.hull_fast,
        config.hull_slow,
        config.confirm_window,
    );
    let gaps = recent_gaps(series, config.min_gap_pct, config.gap_window);

    // Flag detection runs on log closes so pole/flag heights are
    // scale-free ratios.
    let flags = find_flags_pennants(&series.log_closes(), config.flag_order);
    let latest_pattern = flags.most_recent().cloned();
    debug!(ticker = %series.ticker(), patterns = flags.total(), "pattern scan complete");

    let level_sets = rolling_levels(series, &config.level_params);
    let sr_signal = penetration_signal(&closes, &level_sets)
        .last()
        .copied()
        .unwrap_or(0);
    let (mut support, mut resistance) = (Vec::new(), Vec::new());
    if let Some(Some(levels)) = level_sets.last() {
        for &level in levels {
            if level <= last_close {
                support.push(level);
            } else {
                resistance.push(level);
            }
        }
    }

    let channel = find_dynamic_channel(&closes, &config.channel_params)
        .filter(|c| c.width_pct.abs() < MAX_CHANNEL_WIDTH_PCT);

    TickerReport {
        ticker: series.ticker().to_string(),
        last_date: series.last_date(),
        last_close,
        atr: atr::calculate_atr(bars, atr::DEFAULT_PERIOD),
        atr_pct: atr::calculate_atr_pct(bars, atr::DEFAULT_PERIOD),
        annualized_vol: volatility::annualized(&returns),
        beta,
        percent_change: volatility::percent_change(&closes),
        crossovers,
        recent_gaps: gaps,
        bull_flags: flags.bull_flags.len(),
        bear_flags: flags.bear_flags.len(),
        bull_pennants: flags.bull_pennants.len(),
        bear_pennants: flags.bear_pennants.len(),
        latest_pattern,
        support,
        resistance,
        sr_signal,
        pivot_levels: window_levels(series, config.pivot_window),
        channel,
    }
}

/// Scan every discovered ticker, in parallel.
pub fn scan_universe(config: &ScanConfig) -> Result<ScanOutcome> {
    let store = CsvStore::new(&config.data_dir);
    let mut files = store.discover()?;

    // Benchmark first: its returns feed every beta. Resolve it through the
    // discovered file list so on-disk casing does not matter, falling back
    // to a direct by-name load.
    let benchmark_ticker = config.benchmark.to_uppercase();
    let benchmark_result = files
        .iter()
        .find(|f| f.ticker == benchmark_ticker)
        .map(|f| store.load_file(f))
        .unwrap_or_else(|| store.load(&config.benchmark));
    let benchmark_returns: Option<Vec<f64>> = match benchmark_result {
        Ok(series) => Some(volatility::daily_returns(&series.closes())),
        Err(e) => {
            warn!(benchmark = %config.benchmark, error = %e, "benchmark unavailable, beta disabled");
            None
        }
    };

    if !config.tickers.is_empty() {
        let wanted: Vec<String> = config.tickers.iter().map(|t| t.to_uppercase()).collect();
        files.retain(|f| wanted.contains(&f.ticker));
    }
    info!(universe = files.len(), data_dir = %config.data_dir.display(), "scanning universe");

    let results: Vec<Option<TickerReport>> = files
        .par_iter()
        .map(|file| {
            let series = match store.load_file(file) {
                Ok(s) => s,
                Err(e) => {
                    warn!(ticker = %file.ticker, error = %e, "failed to load, skipping");
                    return None;
                }
            };
            if series.len() < config.min_bars {
                warn!(
                    ticker = %file.ticker,
                    bars = series.len(),
                    min_bars = config.min_bars,
                    "too short, skipping"
                );
                return None;
            }
            Some(scan_ticker(&series, benchmark_returns.as_deref(), config))
        })
        .collect();

    let skipped = results.iter().filter(|r| r.is_none()).count();
    let reports: Vec<TickerReport> = results.into_iter().flatten().collect();

    info!(scanned = reports.len(), skipped, "universe scan complete");
    Ok(ScanOutcome { reports, skipped })
}
