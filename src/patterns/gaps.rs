// =============================================================================
// Price Gap Detection
// =============================================================================
//
// A bullish gap: today's low opens clear above yesterday's high.
// A bearish gap: today's high stays clear below yesterday's low.
//
// Both require the relative gap size to reach `min_gap_pct` (a fraction,
// e.g. 0.001 = 0.1 %) measured against the prior bar's reference extreme.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::market_data::PriceSeries;
use crate::types::Direction;

/// A single detected gap.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Gap {
    pub date: NaiveDate,
    pub direction: Direction,
    /// Fractional gap size relative to the prior bar's high (bullish) or
    /// low (bearish).
    pub size: f64,
    /// Index of the gapping bar within the series.
    pub index: usize,
}

/// Find every gap in the series that clears the threshold.
pub fn find_gaps(series: &PriceSeries, min_gap_pct: f64) -> Vec<Gap> {
    let bars = series.bars();
    let mut gaps = Vec::new();

    for i in 1..bars.len() {
        let prev = &bars[i - 1];
        let curr = &bars[i];

        if curr.low > prev.high {
            let size = (curr.low - prev.high) / prev.high;
            if size >= min_gap_pct {
                gaps.push(Gap {
                    date: curr.date,
                    direction: Direction::Bullish,
                    size,
                    index: i,
                });
            }
        } else if curr.high < prev.low {
            let size = (prev.low - curr.high) / prev.low;
            if size >= min_gap_pct {
                gaps.push(Gap {
                    date: curr.date,
                    direction: Direction::Bearish,
                    size,
                    index: i,
                });
            }
        }
    }

    gaps
}

/// Gaps that occurred within the trailing `within_last` sessions.
pub fn recent_gaps(series: &PriceSeries, min_gap_pct: f64, within_last: usize) -> Vec<Gap> {
    let cutoff = series.len().saturating_sub(within_last);
    find_gaps(series, min_gap_pct)
        .into_iter()
        .filter(|g| g.index >= cutoff)
        .collect()
}
