// =============================================================================
// Dynamic Regression Channel Detection
// =============================================================================
//
// Searches an expanding set of lookbacks (shortest first) for a price
// channel: separate least-squares lines fitted through the strongest local
// highs and lows. A channel is accepted when both fits are tight (r²), the
// whole window stays inside the deviation-expanded channel, and each line is
// touched often enough. The trailing `offset_days` bars are excluded so a
// forming breakout does not disturb the fit.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Relative distance below which a price counts as touching a channel line.
const TOUCH_THRESHOLD: f64 = 0.03;

/// Half-width of the dominance window used for local extrema.
const EXTREMA_WINDOW: usize = 10;

fn default_max_lookback() -> usize {
    360
}

fn default_min_lookback() -> usize {
    60
}

fn default_offset_days() -> usize {
    15
}

fn default_deviation_threshold() -> f64 {
    0.1
}

fn default_min_touches() -> usize {
    3
}

fn default_r2_threshold() -> f64 {
    0.6
}

/// Tunable channel-search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelParams {
    #[serde(default = "default_max_lookback")]
    pub max_lookback: usize,
    #[serde(default = "default_min_lookback")]
    pub min_lookback: usize,
    /// Trailing bars excluded from the search window.
    #[serde(default = "default_offset_days")]
    pub offset_days: usize,
    /// Allowed fractional excursion outside the channel lines.
    #[serde(default = "default_deviation_threshold")]
    pub deviation_threshold: f64,
    #[serde(default = "default_min_touches")]
    pub min_touches: usize,
    #[serde(default = "default_r2_threshold")]
    pub r2_threshold: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            max_lookback: default_max_lookback(),
            min_lookback: default_min_lookback(),
            offset_days: default_offset_days(),
            deviation_threshold: default_deviation_threshold(),
            min_touches: default_min_touches(),
            r2_threshold: default_r2_threshold(),
        }
    }
}

/// An accepted channel. Line intercepts are anchored at `start_index`
/// (local x = 0).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Channel {
    pub upper_slope: f64,
    pub upper_intercept: f64,
    pub lower_slope: f64,
    pub lower_intercept: f64,
    /// Absolute index into the close series where the channel window begins.
    pub start_index: usize,
    /// Window length in bars.
    pub lookback: usize,
    /// Channel width at the window end as a percentage of the lower line.
    pub width_pct: f64,
}

/// Ordinary least squares fit of y on x. Returns (slope, intercept, r²),
/// or `None` for degenerate inputs (fewer than two points or zero x-variance).
fn linregress(x: &[f64], y: &[f64]) -> Option<(f64, f64, f64)> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }
    if ss_xx == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    // Flat y has zero variance: the fit is exact, call it r² = 1.
    let r2 = if ss_yy == 0.0 {
        1.0
    } else {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    };
    Some((slope, intercept, r2))
}

/// Local extrema that strictly dominate every neighbour within
/// [`EXTREMA_WINDOW`] bars on each side. Returns (highs, lows) as
/// (window index, price) pairs.
fn find_extrema(window: &[f64]) -> (Vec<(usize, f64)>, Vec<(usize, f64)>) {
    let n = window.len();
    let mut highs = Vec::new();
    let mut lows = Vec::new();

    for i in 1..n.saturating_sub(1) {
        let left = &window[i.saturating_sub(EXTREMA_WINDOW)..i];
        let right = &window[i + 1..(i + 1 + EXTREMA_WINDOW).min(n)];

        let left_max = left.iter().copied().fold(f64::MIN, f64::max);
        let right_max = right.iter().copied().fold(f64::MIN, f64::max);
        if window[i] > left_max && window[i] > right_max {
            highs.push((i, window[i]));
        }

        let left_min = left.iter().copied().fold(f64::MAX, f64::min);
        let right_min = right.iter().copied().fold(f64::MAX, f64::min);
        if window[i] < left_min && window[i] < right_min {
            lows.push((i, window[i]));
        }
    }

    (highs, lows)
}

fn count_touches(window: &[f64], slope: f64, intercept: f64) -> usize {
    window
        .iter()
        .enumerate()
        .filter(|(i, &price)| {
            let line = slope * *i as f64 + intercept;
            line != 0.0 && ((price - line) / line).abs() < TOUCH_THRESHOLD
        })
        .count()
}

/// Search for a dynamic channel over the close series.
///
/// Lookbacks are tried shortest-first; the first window satisfying every
/// acceptance test wins. Returns `None` when no lookback qualifies.
pub fn find_dynamic_channel(closes: &[f64], params: &ChannelParams) -> Option<Channel> {
    let usable = closes.len().saturating_sub(params.offset_days);
    if usable < params.min_lookback {
        return None;
    }
    let prices = &closes[..usable];

    for lookback in params.min_lookback..params.max_lookback {
        if lookback > prices.len() {
            break;
        }
        let window = &prices[prices.len() - lookback..];

        let (mut highs, mut lows) = find_extrema(window);
        if highs.len() < params.min_touches || lows.len() < params.min_touches {
            continue;
        }

        // Strongest extremes first: highest peaks, lowest troughs.
        highs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        lows.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let top_n = highs.len().min(lows.len()).min(params.min_touches);

        let high_x: Vec<f64> = highs[..top_n].iter().map(|(i, _)| *i as f64).collect();
        let high_y: Vec<f64> = highs[..top_n].iter().map(|(_, p)| *p).collect();
        let low_x: Vec<f64> = lows[..top_n].iter().map(|(i, _)| *i as f64).collect();
        let low_y: Vec<f64> = lows[..top_n].iter().map(|(_, p)| *p).collect();

        let Some((upper_slope, upper_intercept, upper_r2)) = linregress(&high_x, &high_y)
        else {
            continue;
        };
        let Some((lower_slope, lower_intercept, lower_r2)) = linregress(&low_x, &low_y)
        else {
            continue;
        };
        if upper_r2 < params.r2_threshold || lower_r2 < params.r2_threshold {
            continue;
        }

        // Every close must stay inside the deviation-expanded channel.
        let contained = window.iter().enumerate().all(|(i, &price)| {
            let upper = upper_slope * i as f64 + upper_intercept;
            let lower = lower_slope * i as f64 + lower_intercept;
            price <= upper * (1.0 + params.deviation_threshold)
                && price >= lower * (1.0 - params.deviation_threshold)
        });
        if !contained {
            continue;
        }

        if count_touches(window, upper_slope, upper_intercept) < params.min_touches
            || count_touches(window, lower_slope, lower_intercept) < params.min_touches
        {
            continue;
        }

        let end_x = (lookback - 1) as f64;
        let upper_end = upper_slope * end_x + upper_intercept;
        let lower_end = lower_slope * end_x + lower_intercept;
        if lower_end == 0.0 {
            continue;
        }

        return Some(Channel {
            upper_slope,
            upper_intercept,
            lower_slope,
            lower_intercept,
            start_index: prices.len() - lookback,
            lookback,
            width_pct: (upper_end - lower_end) / lower_end * 100.0,
        });
    }

    None
}
