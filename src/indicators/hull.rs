// =============================================================================
// Hull Moving Average (HMA) and confirmed crossover detection
// =============================================================================
//
// WMA (linearly weighted): most recent bar gets weight `period`, oldest in
// the window gets weight 1.
//
// HMA(n) = WMA( 2 * WMA(n/2) - WMA(n), floor(sqrt(n)) )
//
// The crossover scan looks at the trailing `window` bars of a fast/slow HMA
// pair (5 / 34 by default) and reports only *confirmed* signals:
//
//   Bullish — CAHOLD (Close Above High Of Low Day): the latest close must be
//   above the high of the lowest-low day since the crossover.
//   Bearish — CBLOHD (Close Below Low Of High Day): the latest close must be
//   below the low of the highest-high day since the crossover.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::market_data::Bar;
use crate::types::Direction;

/// Weighted moving average, aligned with the input: entry `i` is `Some` from
/// index `period - 1` onward. `period == 0` or an oversized period yields an
/// all-`None` vec.
pub fn wma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let mut out = vec![None; n];
    if period == 0 || period > n {
        return out;
    }

    // Triangular weight sum: 1 + 2 + ... + period.
    let weight_sum = (period * (period + 1)) as f64 / 2.0;

    for i in (period - 1)..n {
        let window = &data[i + 1 - period..=i];
        let mut acc = 0.0;
        for (k, &v) in window.iter().enumerate() {
            acc += v * (k + 1) as f64;
        }
        let value = acc / weight_sum;
        if value.is_finite() {
            out[i] = Some(value);
        }
    }

    out
}

/// Hull moving average, aligned with the input.
///
/// Entries are `None` until both inner WMAs and the outer smoothing window
/// are warm. Returns all-`None` for `period < 2` or insufficient data.
pub fn hma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let mut out = vec![None; n];
    if period < 2 || period > n {
        return out;
    }

    let half = period / 2;
    let sqrt_period = (period as f64).sqrt().floor() as usize;
    if half == 0 || sqrt_period == 0 {
        return out;
    }

    let wma_full = wma(data, period);
    let wma_half = wma(data, half);

    // Raw series 2*WMA(n/2) - WMA(n), defined from index period - 1 onward.
    let start = period - 1;
    let raw: Vec<f64> = (start..n)
        .filter_map(|i| match (wma_half[i], wma_full[i]) {
            (Some(h), Some(f)) => Some(2.0 * h - f),
            _ => None,
        })
        .collect();
    if raw.len() < sqrt_period {
        return out;
    }

    let smoothed = wma(&raw, sqrt_period);
    for (j, value) in smoothed.into_iter().enumerate() {
        out[start + j] = value;
    }

    out
}

/// A confirmed Hull MA crossover.
#[derive(Debug, Clone, Serialize)]
pub struct HullCrossover {
    pub date: NaiveDate,
    pub direction: Direction,
    /// The confirmation reference: high of the low day (bullish) or low of
    /// the high day (bearish) since the crossover.
    pub confirm_level: f64,
}

/// Scan the trailing `window` bars for confirmed fast/slow HMA crossovers.
///
/// Mirrors the per-ticker scan loop: raw crossovers inside the window are
/// kept only when the latest close passes the CAHOLD / CBLOHD check.
pub fn confirmed_crossovers(
    bars: &[Bar],
    fast_period: usize,
    slow_period: usize,
    window: usize,
) -> Vec<HullCrossover> {
    let n = bars.len();
    if n < slow_period + 2 || window < 2 {
        return Vec::new();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast = hma(&closes, fast_period);
    let slow = hma(&closes, slow_period);
    let latest_close = closes[n - 1];

    let start = n.saturating_sub(window).max(1);
    let mut confirmed = Vec::new();

    for i in start..n {
        let (Some(f_prev), Some(s_prev), Some(f_curr), Some(s_curr)) =
            (fast[i - 1], slow[i - 1], fast[i], slow[i])
        else {
            continue;
        };

        if f_prev < s_prev && f_curr > s_curr {
            // Bullish cross: find the lowest-low day from the cross onward.
            let low_day = (i..n)
                .min_by(|&a, &b| bars[a].low.partial_cmp(&bars[b].low).unwrap())
                .unwrap_or(i);
            let high_of_low_day = bars[low_day].high;
            if latest_close > high_of_low_day {
                confirmed.push(HullCrossover {
                    date: bars[i].date,
                    direction: Direction::Bullish,
                    confirm_level: high_of_low_day,
                });
            }
        } else if f_prev > s_prev && f_curr < s_curr {
            // Bearish cross: find the highest-high day from the cross onward.
            let high_day = (i..n)
                .max_by(|&a, &b| bars[a].high.partial_cmp(&bars[b].high).unwrap())
                .unwrap_or(i);
            let low_of_high_day = bars[high_day].low;
            if latest_close < low_of_high_day {
                confirmed.push(HullCrossover {
                    date: bars[i].date,
                    direction: Direction::Bearish,
                    confirm_level: low_of_high_day,
                });
            }
        }
    }

    confirmed
}
