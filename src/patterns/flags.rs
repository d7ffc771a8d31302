// =============================================================================
// Flag / Pennant Detection via Perceptually Important Points
// =============================================================================
//
// A flag is a short consolidation following a sharp move (the "pole"):
//
//   - a local extremum arms a *pending* pattern whose base sits `order` bars
//     back (the start of the pole);
//   - every subsequent bar the pending pattern is re-tested: the pole tip is
//     the window extreme, the consolidation after it must be short and
//     shallow relative to the pole, and the 5 PIPs of the consolidation must
//     form a converging/parallel two-line channel with a breakout at the
//     final point;
//   - a confirmed pattern with tilted-against-trend lines is a flag; one
//     whose lines converge with the trend is a pennant.
//
// Detection runs on log closes so pole/flag proportions are scale-free.
// =============================================================================

use serde::Serialize;

use crate::patterns::pips::{find_pips, DistanceMeasure};
use crate::types::Direction;

/// Number of PIPs used to describe the consolidation.
const FLAG_PIPS: usize = 5;

/// A confirmed flag or pennant.
#[derive(Debug, Clone, Serialize)]
pub struct FlagPattern {
    pub direction: Direction,
    /// True for a pennant (converging lines), false for a flag.
    pub pennant: bool,

    /// Start of the pole (index / price).
    pub base_x: usize,
    pub base_y: f64,
    /// Tip of the pole == start of the consolidation.
    pub tip_x: usize,
    pub tip_y: f64,
    /// Bar where the pattern confirmed (breakout).
    pub conf_x: usize,
    pub conf_y: f64,

    pub pole_width: usize,
    pub pole_height: f64,
    pub flag_width: usize,
    pub flag_height: f64,

    /// Consolidation channel lines, intercepts anchored at `tip_x`.
    pub support_slope: f64,
    pub support_intercept: f64,
    pub resist_slope: f64,
    pub resist_intercept: f64,
}

/// The four result buckets of a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlagBuckets {
    pub bull_flags: Vec<FlagPattern>,
    pub bear_flags: Vec<FlagPattern>,
    pub bull_pennants: Vec<FlagPattern>,
    pub bear_pennants: Vec<FlagPattern>,
}

impl FlagBuckets {
    pub fn total(&self) -> usize {
        self.bull_flags.len()
            + self.bear_flags.len()
            + self.bull_pennants.len()
            + self.bear_pennants.len()
    }

    /// The most recently confirmed pattern across all buckets.
    pub fn most_recent(&self) -> Option<&FlagPattern> {
        self.bull_flags
            .iter()
            .chain(&self.bear_flags)
            .chain(&self.bull_pennants)
            .chain(&self.bear_pennants)
            .max_by_key(|p| p.conf_x)
    }
}

/// Scan a (log) close series for flags and pennants.
///
/// `order` is the pole look-back armed at each local extremum; callers must
/// pass `order >= 3` (smaller values make the pole degenerate).
pub fn find_flags_pennants(data: &[f64], order: usize) -> FlagBuckets {
    let mut buckets = FlagBuckets::default();
    if order < 3 || data.len() < order + 2 {
        return buckets;
    }

    let mut pending_bull: Option<(usize, f64)> = None;
    let mut pending_bear: Option<(usize, f64)> = None;

    for i in 1..data.len() {
        // 1-neighbor local extrema arm a pending pattern with the base
        // `order` bars back.
        if i >= order && i + 1 < data.len() {
            if data[i - 1] < data[i] && data[i + 1] < data[i] {
                pending_bear = Some((i - order, data[i - order]));
            }
            if data[i - 1] > data[i] && data[i + 1] > data[i] {
                pending_bull = Some((i - order, data[i - order]));
            }
        }

        if let Some((base_x, base_y)) = pending_bear {
            if let Some(pattern) = check_bear_pattern(data, base_x, base_y, i, order) {
                if pattern.pennant {
                    buckets.bear_pennants.push(pattern);
                } else {
                    buckets.bear_flags.push(pattern);
                }
                pending_bear = None;
            }
        }

        if let Some((base_x, base_y)) = pending_bull {
            if let Some(pattern) = check_bull_pattern(data, base_x, base_y, i, order) {
                if pattern.pennant {
                    buckets.bull_pennants.push(pattern);
                } else {
                    buckets.bull_flags.push(pattern);
                }
                pending_bull = None;
            }
        }
    }

    buckets
}

/// Index of the maximum value in `data[from..=to]` (absolute index).
fn argmax(data: &[f64], from: usize, to: usize) -> usize {
    let mut best = from;
    for i in from..=to {
        if data[i] > data[best] {
            best = i;
        }
    }
    best
}

/// Index of the minimum value in `data[from..=to]` (absolute index).
fn argmin(data: &[f64], from: usize, to: usize) -> usize {
    let mut best = from;
    for i in from..=to {
        if data[i] < data[best] {
            best = i;
        }
    }
    best
}

fn check_bull_pattern(
    data: &[f64],
    base_x: usize,
    base_y: f64,
    i: usize,
    order: usize,
) -> Option<FlagPattern> {
    // Pole tip: the window maximum since the base.
    let tip_x = argmax(data, base_x, i);
    let pole_width = tip_x - base_x;
    let flag_width = i - tip_x;

    // The consolidation must have had time to form...
    if (flag_width as f64) < 5f64.max(order as f64 * 0.5) {
        return None;
    }
    // ...but stay short and shallow relative to the pole.
    if flag_width as f64 > pole_width as f64 * 0.5 {
        return None;
    }
    let tip_y = data[tip_x];
    let pole_height = tip_y - base_y;
    let flag_low = data[argmin(data, tip_x, i)];
    let flag_height = tip_y - flag_low;
    if flag_height > pole_height * 0.5 {
        return None;
    }

    let pips = find_pips(&data[tip_x..=i], FLAG_PIPS, DistanceMeasure::Vertical);
    if pips.len() < FLAG_PIPS {
        return None;
    }

    // The middle PIP must be a local high between the two line anchors.
    if !(pips[2].1 > pips[1].1 && pips[2].1 > pips[3].1) {
        return None;
    }

    // Resistance through PIPs 0 and 2, support through PIPs 1 and 3;
    // intercepts anchored at the tip (local x = 0).
    let resist_slope = (pips[2].1 - pips[0].1) / (pips[2].0 - pips[0].0) as f64;
    let resist_intercept = pips[0].1;
    let support_slope = (pips[3].1 - pips[1].1) / (pips[3].0 - pips[1].0) as f64;
    let support_intercept = pips[1].1 - pips[1].0 as f64 * support_slope;

    // Where the two lines meet; parallel lines get a sentinel far behind.
    let intersection = if resist_slope != support_slope {
        (support_intercept - resist_intercept) / (resist_slope - support_slope)
    } else {
        -(flag_width as f64) * 100.0
    };

    // The apex must not fall inside the flag window...
    if intersection <= pips[4].0 as f64 && intersection >= 0.0 {
        return None;
    }
    // ...nor just behind it (harshly diverging lines).
    if intersection < 0.0 && intersection > -(flag_width as f64) {
        return None;
    }

    // Breakout: the final PIP must clear the resistance endpoint.
    let resist_endpoint = pips[0].1 + resist_slope * pips[4].0 as f64;
    if pips[4].1 < resist_endpoint {
        return None;
    }

    Some(FlagPattern {
        direction: Direction::Bullish,
        pennant: support_slope > 0.0,
        base_x,
        base_y,
        tip_x,
        tip_y,
        conf_x: i,
        conf_y: data[i],
        pole_width,
        pole_height,
        flag_width,
        flag_height,
        support_slope,
        support_intercept,
        resist_slope,
        resist_intercept,
    })
}

fn check_bear_pattern(
    data: &[f64],
    base_x: usize,
    base_y: f64,
    i: usize,
    order: usize,
) -> Option<FlagPattern> {
    let tip_x = argmin(data, base_x, i);
    let pole_width = tip_x - base_x;
    let flag_width = i - tip_x;

    if (flag_width as f64) < 5f64.max(order as f64 * 0.5) {
        return None;
    }
    if flag_width as f64 > pole_width as f64 * 0.5 {
        return None;
    }
    let tip_y = data[tip_x];
    let pole_height = base_y - tip_y;
    let flag_high = data[argmax(data, tip_x, i)];
    let flag_height = flag_high - tip_y;
    if flag_height > pole_height * 0.5 {
        return None;
    }

    let pips = find_pips(&data[tip_x..=i], FLAG_PIPS, DistanceMeasure::Vertical);
    if pips.len() < FLAG_PIPS {
        return None;
    }

    // The middle PIP must be a local low between the two line anchors.
    if !(pips[2].1 < pips[1].1 && pips[2].1 < pips[3].1) {
        return None;
    }

    // Support through PIPs 0 and 2, resistance through PIPs 1 and 3.
    let support_slope = (pips[2].1 - pips[0].1) / (pips[2].0 - pips[0].0) as f64;
    let support_intercept = pips[0].1;
    let resist_slope = (pips[3].1 - pips[1].1) / (pips[3].0 - pips[1].0) as f64;
    let resist_intercept = pips[1].1 - pips[1].0 as f64 * resist_slope;

    let intersection = if resist_slope != support_slope {
        (support_intercept - resist_intercept) / (resist_slope - support_slope)
    } else {
        -(flag_width as f64) * 100.0
    };

    if intersection <= pips[4].0 as f64 && intersection >= 0.0 {
        return None;
    }
    if intersection < 0.0 && intersection > -(flag_width as f64) {
        return None;
    }

    // Breakdown: the final PIP must fall through the support endpoint.
    let support_endpoint = pips[0].1 + support_slope * pips[4].0 as f64;
    if pips[4].1 > support_endpoint {
        return None;
    }

    Some(FlagPattern {
        direction: Direction::Bearish,
        pennant: resist_slope < 0.0,
        base_x,
        base_y,
        tip_x,
        tip_y,
        conf_x: i,
        conf_y: data[i],
        pole_width,
        pole_height,
        flag_width,
        flag_height,
        support_slope,
        support_intercept,
        resist_slope,
        resist_intercept,
    })
}
