// =============================================================================
// Support / Resistance Levels — Market-Profile KDE
// =============================================================================
//
// Levels come from a weighted kernel density estimate of log closes: recent
// bars weigh more, the bandwidth scales with the log-space ATR, and the
// density's prominent peaks mark prices the market keeps returning to.
// Nearby peaks are clustered so one congestion zone yields one level.
// =============================================================================

pub mod kde;
pub mod peaks;

use serde::{Deserialize, Serialize};

use crate::indicators::atr::log_atr_series;
use crate::market_data::PriceSeries;
use kde::WeightedKde;
use peaks::find_peaks;

/// Density grid resolution across the window's price range.
const GRID_POINTS: usize = 200;

fn default_lookback() -> usize {
    75
}

fn default_first_w() -> f64 {
    0.08
}

fn default_atr_mult() -> f64 {
    2.0
}

fn default_prom_thresh() -> f64 {
    0.0008
}

fn default_distance() -> usize {
    1
}

fn default_max_levels() -> usize {
    12
}

fn default_cluster_threshold() -> f64 {
    1.5
}

/// Tunable level-finder parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    /// Trailing window length in bars.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Weight assigned to the oldest bar in the window (newest gets 1.0).
    #[serde(default = "default_first_w")]
    pub first_w: f64,
    /// Bandwidth factor: `atr_mult × log-ATR`.
    #[serde(default = "default_atr_mult")]
    pub atr_mult: f64,
    /// Minimum peak prominence as a fraction of the density maximum.
    #[serde(default = "default_prom_thresh")]
    pub prom_thresh: f64,
    /// Minimum grid distance between peaks.
    #[serde(default = "default_distance")]
    pub distance: usize,
    /// Cap on levels kept per window (most prominent first).
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Cluster-merge threshold in log-ATR multiples.
    #[serde(default = "default_cluster_threshold")]
    pub cluster_threshold: f64,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            first_w: default_first_w(),
            atr_mult: default_atr_mult(),
            prom_thresh: default_prom_thresh(),
            distance: default_distance(),
            max_levels: default_max_levels(),
            cluster_threshold: default_cluster_threshold(),
        }
    }
}

/// Merge levels closer than `threshold × atr`, ascending; the lowest member
/// of each cluster survives. Inputs and the ATR must share one scale
/// (here: natural-log prices).
pub fn cluster_levels(levels: &[f64], atr: f64, threshold: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = levels.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut clustered: Vec<f64> = Vec::with_capacity(sorted.len());
    for level in sorted {
        match clustered.last() {
            Some(&prev) if level - prev <= threshold * atr => {}
            _ => clustered.push(level),
        }
    }
    clustered
}

/// Extract support/resistance levels from one window of log closes.
///
/// Returns level prices in ascending order (converted back with `exp`),
/// or an empty vec when the window is degenerate (flat prices, zero ATR).
pub fn find_levels(log_closes: &[f64], log_atr: f64, params: &LevelParams) -> Vec<f64> {
    let n = log_closes.len();
    if n < 2 || !(log_atr > 0.0) {
        return Vec::new();
    }

    // Linear recency ramp from first_w to just under 1.0.
    let step = (1.0 - params.first_w) / n as f64;
    let weights: Vec<f64> = (0..n)
        .map(|i| (params.first_w + i as f64 * step).max(0.0))
        .collect();

    let Some(kde) = WeightedKde::new(log_closes, &weights, log_atr * params.atr_mult) else {
        return Vec::new();
    };

    let lo = log_closes.iter().copied().fold(f64::MAX, f64::min);
    let hi = log_closes.iter().copied().fold(f64::MIN, f64::max);
    if !(hi > lo) {
        return Vec::new();
    }
    let grid_step = (hi - lo) / (GRID_POINTS - 1) as f64;
    let grid: Vec<f64> = (0..GRID_POINTS).map(|k| lo + k as f64 * grid_step).collect();
    let pdf = kde.evaluate_grid(&grid);

    let pdf_max = pdf.iter().copied().fold(f64::MIN, f64::max);
    if !(pdf_max > 0.0) {
        return Vec::new();
    }

    let mut found = find_peaks(&pdf, pdf_max * params.prom_thresh, params.distance);
    found.sort_by(|a, b| b.prominence.partial_cmp(&a.prominence).unwrap());
    found.truncate(params.max_levels);

    let log_levels: Vec<f64> = found.iter().map(|p| grid[p.index]).collect();
    cluster_levels(&log_levels, log_atr, params.cluster_threshold)
        .into_iter()
        .map(f64::exp)
        .collect()
}

/// Per-bar level sets over a trailing `lookback` window.
///
/// Entry `i` is `None` until a full window and its log-ATR are available.
pub fn rolling_levels(series: &PriceSeries, params: &LevelParams) -> Vec<Option<Vec<f64>>> {
    let log_closes = series.log_closes();
    let atr = log_atr_series(series.bars(), params.lookback);
    let n = log_closes.len();
    let mut out: Vec<Option<Vec<f64>>> = vec![None; n];
    if params.lookback == 0 {
        return out;
    }

    for i in (params.lookback - 1)..n {
        let Some(atr_i) = atr[i] else { continue };
        let window = &log_closes[i + 1 - params.lookback..=i];
        out[i] = Some(find_levels(window, atr_i, params));
    }
    out
}

/// Stateful level-penetration signal: +1 after an upward cross of any level,
/// −1 after a downward cross, holding between crossings. Aligned with the
/// close series.
pub fn penetration_signal(closes: &[f64], level_sets: &[Option<Vec<f64>>]) -> Vec<i32> {
    let n = closes.len().min(level_sets.len());
    let mut signal = vec![0i32; closes.len()];
    let mut last_sig = 0i32;

    for i in 1..n {
        if let Some(levels) = &level_sets[i] {
            for &level in levels {
                if closes[i] > level && closes[i - 1] <= level {
                    last_sig = 1;
                } else if closes[i] < level && closes[i - 1] >= level {
                    last_sig = -1;
                }
            }
        }
        signal[i] = last_sig;
    }
    signal
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;
    use chrono::NaiveDate;

    fn series_from_closes(closes: &[f64], range: f64) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: base + chrono::Days::new(i as u64),
                open: close,
                high: close + range,
                low: close - range,
                close,
                volume: 1_000.0,
            })
            .collect();
        PriceSeries::new("X", bars).unwrap()
    }

    #[test]
    fn params_default_from_empty_json() {
        let params: LevelParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.lookback, 75);
        assert_eq!(params.max_levels, 12);
        assert!((params.first_w - 0.08).abs() < 1e-12);
    }

    #[test]
    fn cluster_merges_nearby_levels() {
        let levels = [1.00, 1.01, 1.02, 2.00];
        let clustered = cluster_levels(&levels, 0.02, 1.5);
        // 1.00 absorbs 1.01 and 1.02 (within 0.03); 2.00 stands alone.
        assert_eq!(clustered, vec![1.00, 2.00]);
    }

    #[test]
    fn cluster_keeps_distant_levels() {
        let levels = [3.0, 1.0, 2.0];
        let clustered = cluster_levels(&levels, 0.01, 1.5);
        assert_eq!(clustered, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn find_levels_on_bimodal_window() {
        // Two congestion zones near 100 and 110.
        let mut log_closes = Vec::new();
        for i in 0..40 {
            log_closes.push((100.0 + 0.1 * ((i % 5) as f64 - 2.0)).ln());
        }
        for i in 0..35 {
            log_closes.push((110.0 + 0.1 * ((i % 5) as f64 - 2.0)).ln());
        }

        let levels = find_levels(&log_closes, 0.01, &LevelParams::default());
        assert_eq!(levels.len(), 2, "expected one level per zone, got {levels:?}");
        assert!((levels[0] - 100.0).abs() < 2.0, "lower level off: {}", levels[0]);
        assert!((levels[1] - 110.0).abs() < 2.0, "upper level off: {}", levels[1]);
    }

    #[test]
    fn find_levels_flat_window_is_empty() {
        let log_closes = vec![100.0_f64.ln(); 50];
        assert!(find_levels(&log_closes, 0.01, &LevelParams::default()).is_empty());
        let varied: Vec<f64> = (0..50).map(|i| (100.0 + i as f64).ln()).collect();
        assert!(find_levels(&varied, 0.0, &LevelParams::default()).is_empty());
    }

    #[test]
    fn rolling_levels_warmup_is_none() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 5.0 * ((i as f64) * 0.4).sin())
            .collect();
        let series = series_from_closes(&closes, 1.0);
        let params = LevelParams {
            lookback: 20,
            ..LevelParams::default()
        };

        let sets = rolling_levels(&series, &params);
        assert_eq!(sets.len(), 60);
        assert!(sets[..20].iter().all(Option::is_none));
        assert!(sets[20..].iter().all(Option::is_some));
    }

    #[test]
    fn penetration_signal_flips_and_holds() {
        let closes = [9.0, 11.0, 11.5, 8.0, 8.5];
        let sets: Vec<Option<Vec<f64>>> = vec![Some(vec![10.0]); 5];
        let signal = penetration_signal(&closes, &sets);
        // Upward cross at 1, hold at 2, downward cross at 3, hold at 4.
        assert_eq!(signal, vec![0, 1, 1, -1, -1]);
    }

    #[test]
    fn penetration_signal_ignores_missing_sets() {
        let closes = [9.0, 11.0, 8.0];
        let sets: Vec<Option<Vec<f64>>> = vec![None, None, None];
        assert_eq!(penetration_signal(&closes, &sets), vec![0, 0, 0]);
    }
}
