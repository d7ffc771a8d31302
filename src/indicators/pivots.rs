// =============================================================================
// Pivot Points and Fibonacci Levels
// =============================================================================
//
// Classic pivot: P = (H + L + C) / 3, with the standard resistance/support
// ladder and the Fibonacci pivot variants (0.382 / 0.618 / 1.000 of the
// range). The window variant computes both ladders over a trailing window
// (H = window max high, L = window min low, C = last close), merges them
// with the Fibonacci retracement ladder, and tags each level relative to the
// last close.
// =============================================================================

use serde::Serialize;

use crate::market_data::PriceSeries;
use crate::types::{LevelKind, PriceLevel};

/// The full pivot ladder for one (H, L, C) triple.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub fib_r1: f64,
    pub fib_r2: f64,
    pub fib_r3: f64,
    pub fib_s1: f64,
    pub fib_s2: f64,
    pub fib_s3: f64,
}

impl PivotLevels {
    /// Compute the ladder. Returns `None` for non-finite inputs or H < L.
    pub fn compute(high: f64, low: f64, close: f64) -> Option<Self> {
        if !high.is_finite() || !low.is_finite() || !close.is_finite() || high < low {
            return None;
        }

        let pivot = (high + low + close) / 3.0;
        let range = high - low;

        Some(Self {
            pivot,
            r1: 2.0 * pivot - low,
            r2: pivot + range,
            r3: high + 2.0 * (pivot - low),
            s1: 2.0 * pivot - high,
            s2: pivot - range,
            s3: low - 2.0 * (high - pivot),
            fib_r1: pivot + 0.382 * range,
            fib_r2: pivot + 0.618 * range,
            fib_r3: pivot + range,
            fib_s1: pivot - 0.382 * range,
            fib_s2: pivot - 0.618 * range,
            fib_s3: pivot - range,
        })
    }

    /// All ladder values, unordered.
    pub fn values(&self) -> [f64; 13] {
        [
            self.pivot, self.r1, self.r2, self.r3, self.s1, self.s2, self.s3,
            self.fib_r1, self.fib_r2, self.fib_r3, self.fib_s1, self.fib_s2,
            self.fib_s3,
        ]
    }
}

/// Fibonacci retracement / extension ladder over a high-low range, sorted
/// descending: extensions 161.8% and 127.2%, then 100% down to 0%.
pub fn fibonacci_retracements(high: f64, low: f64) -> Vec<f64> {
    if !high.is_finite() || !low.is_finite() || high < low {
        return Vec::new();
    }
    let range = high - low;
    vec![
        high + range * 0.618, // Ext 161.8%
        high + range * 0.272, // Ext 127.2%
        high,                 // 100%
        high - range * 0.214, // 78.6%
        high - range * 0.382, // 61.8%
        high - range * 0.5,   // 50%
        high - range * 0.618, // 38.2%
        high - range * 0.764, // 23.6%
        low,                  // 0%
    ]
}

/// Pivot + Fibonacci levels over the trailing `window` bars of a series,
/// de-duplicated, sorted descending, tagged against the last close.
///
/// Returns an empty vec when the series is shorter than two bars.
pub fn window_levels(series: &PriceSeries, window: usize) -> Vec<PriceLevel> {
    let bars = series.bars();
    if bars.len() < 2 || window == 0 {
        return Vec::new();
    }

    let start = bars.len().saturating_sub(window);
    let recent = &bars[start..];

    let high = recent.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = recent.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let close = series.last_close();

    let Some(pivots) = PivotLevels::compute(high, low, close) else {
        return Vec::new();
    };

    let mut values: Vec<f64> = pivots.values().to_vec();
    values.extend(fibonacci_retracements(high, low));
    values.sort_by(|a, b| b.partial_cmp(a).unwrap());

    // De-duplicate near-identical levels (the two ladders share endpoints).
    let mut levels: Vec<PriceLevel> = Vec::with_capacity(values.len());
    for value in values {
        if let Some(last) = levels.last() {
            if (last.price - value).abs() < close * 1e-9 {
                continue;
            }
        }
        let kind = if value > close {
            LevelKind::Resistance
        } else {
            LevelKind::Support
        };
        levels.push(PriceLevel { price: value, kind });
    }

    levels
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;

    #[test]
    fn pivot_is_hlc_mean() {
        let p = PivotLevels::compute(110.0, 90.0, 105.0).unwrap();
        assert!((p.pivot - (110.0 + 90.0 + 105.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn ladder_ordering() {
        let p = PivotLevels::compute(110.0, 90.0, 100.0).unwrap();
        assert!(p.s3 <= p.s2 && p.s2 <= p.s1 && p.s1 <= p.pivot);
        assert!(p.pivot <= p.r1 && p.r1 <= p.r2 && p.r2 <= p.r3);
        assert!(p.fib_s3 <= p.fib_s2 && p.fib_s2 <= p.fib_s1);
        assert!(p.fib_r1 <= p.fib_r2 && p.fib_r2 <= p.fib_r3);
    }

    #[test]
    fn degenerate_range_collapses_to_pivot() {
        let p = PivotLevels::compute(100.0, 100.0, 100.0).unwrap();
        for v in p.values() {
            assert!((v - 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(PivotLevels::compute(90.0, 110.0, 100.0).is_none());
    }

    #[test]
    fn retracements_sorted_descending() {
        let levels = fibonacci_retracements(200.0, 100.0);
        assert_eq!(levels.len(), 9);
        for pair in levels.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert!((levels[2] - 200.0).abs() < 1e-12); // 100% == high
        assert!((levels[8] - 100.0).abs() < 1e-12); // 0% == low
    }

    #[test]
    fn window_levels_tagging() {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<Bar> = (0..30)
            .map(|i| Bar {
                date: base + chrono::Days::new(i),
                open: 100.0,
                high: 110.0,
                low: 90.0,
                close: 100.0,
                volume: 1.0,
            })
            .collect();
        let series = PriceSeries::new("X", bars).unwrap();
        let levels = window_levels(&series, 20);
        assert!(!levels.is_empty());
        for level in &levels {
            match level.kind {
                LevelKind::Resistance => assert!(level.price > 100.0),
                LevelKind::Support => assert!(level.price <= 100.0),
            }
        }
        // Sorted descending.
        for pair in levels.windows(2) {
            assert!(pair[0].price > pair[1].price);
        }
    }
}
