// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// Default period: 14. The level finder uses the log-space variant so that
// level clustering works on relative (percentage) distances.
// =============================================================================

use crate::market_data::Bar;

/// Standard look-back used by the scanner's headline ATR.
pub const DEFAULT_PERIOD: usize = 14;

/// Compute the full ATR series for the given high/low/close columns.
///
/// The output is aligned with the input: entry `i` is `Some(atr)` once at
/// least `period` true ranges are available (i.e. from index `period`
/// onward), `None` during warm-up. Returns an all-`None` vec when `period`
/// is zero or the series is too short.
pub fn atr_series(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || n < period + 1 || highs.len() != n || lows.len() != n {
        return out;
    }

    let mut tr_values: Vec<f64> = Vec::with_capacity(n - 1);
    for i in 1..n {
        let hl = highs[i] - lows[i];
        let hc = (highs[i] - closes[i - 1]).abs();
        let lc = (lows[i] - closes[i - 1]).abs();
        // f64::max returns the non-NaN operand, so a poisoned component
        // would otherwise vanish in the max() chain instead of invalidating
        // the series.
        if !(hl.is_finite() && hc.is_finite() && lc.is_finite()) {
            return out;
        }
        tr_values.push(hl.max(hc).max(lc));
    }

    // Seed with the SMA of the first `period` TR values, then Wilder-smooth.
    let seed: f64 = tr_values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return out;
    }
    out[period] = Some(seed);

    let period_f = period as f64;
    let mut atr = seed;
    for (j, &tr) in tr_values.iter().enumerate().skip(period) {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        if !atr.is_finite() {
            return vec![None; n];
        }
        // tr_values[j] belongs to bar j + 1.
        out[j + 1] = Some(atr);
    }

    out
}

/// Most recent ATR value from a slice of OHLCV bars.
///
/// Returns `None` when `period` is zero, there are fewer than `period + 1`
/// bars, or any intermediate value is non-finite.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Option<f64> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    atr_series(&highs, &lows, &closes, period).last().copied()?
}

/// ATR as a percentage of the last close — comparable across price scales.
pub fn calculate_atr_pct(bars: &[Bar], period: usize) -> Option<f64> {
    let atr = calculate_atr(bars, period)?;
    let last_close = bars.last()?.close;
    if last_close == 0.0 {
        return None;
    }
    Some((atr / last_close) * 100.0)
}

/// ATR series over natural-log prices. All inputs must be positive.
pub fn log_atr_series(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high.ln()).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low.ln()).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close.ln()).collect();
    atr_series(&highs, &lows, &closes, period)
}
