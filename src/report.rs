// =============================================================================
// Report Writer — signals.csv + summary.json
// =============================================================================
//
// Flattens every per-ticker finding into one signal row per event and writes
// the two run artifacts: a CSV for spreadsheet triage and a pretty JSON dump
// of the full reports. The JSON write is atomic (tmp + rename), same as the
// config save.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::scanner::{ScanOutcome, TickerReport};

/// One row in signals.csv.
#[derive(Debug, Clone, Serialize)]
pub struct SignalRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub kind: String,
    pub direction: String,
    pub value: f64,
    pub detail: String,
}

/// Per-run totals, logged at the end of a scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanSummary {
    pub tickers_scanned: usize,
    pub tickers_skipped: usize,
    pub crossovers: usize,
    pub gaps: usize,
    pub patterns: usize,
    pub channels: usize,
}

/// Flatten one report into signal rows.
pub fn signal_rows(report: &TickerReport) -> Vec<SignalRow> {
    let mut rows = Vec::new();

    for cross in &report.crossovers {
        rows.push(SignalRow {
            ticker: report.ticker.clone(),
            date: cross.date,
            kind: "hull_crossover".to_string(),
            direction: cross.direction.to_string(),
            value: cross.confirm_level,
            detail: format!("confirmed vs close {:.2}", report.last_close),
        });
    }

    for gap in &report.recent_gaps {
        rows.push(SignalRow {
            ticker: report.ticker.clone(),
            date: gap.date,
            kind: "gap".to_string(),
            direction: gap.direction.to_string(),
            value: gap.size,
            detail: format!("{:.2}%", gap.size * 100.0),
        });
    }

    if let Some(pattern) = &report.latest_pattern {
        let kind = if pattern.pennant { "pennant" } else { "flag" };
        rows.push(SignalRow {
            ticker: report.ticker.clone(),
            date: report.last_date,
            kind: kind.to_string(),
            direction: pattern.direction.to_string(),
            value: pattern.conf_y.exp(),
            detail: format!(
                "pole {} bars / consolidation {} bars",
                pattern.pole_width, pattern.flag_width
            ),
        });
    }

    if let Some(channel) = &report.channel {
        let direction = if channel.upper_slope >= 0.0 { "Bullish" } else { "Bearish" };
        rows.push(SignalRow {
            ticker: report.ticker.clone(),
            date: report.last_date,
            kind: "channel".to_string(),
            direction: direction.to_string(),
            value: channel.width_pct,
            detail: format!("{} bars, slope {:.4}", channel.lookback, channel.upper_slope),
        });
    }

    if report.sr_signal != 0 {
        rows.push(SignalRow {
            ticker: report.ticker.clone(),
            date: report.last_date,
            kind: "sr_penetration".to_string(),
            direction: if report.sr_signal > 0 { "Bullish" } else { "Bearish" }.to_string(),
            value: report.sr_signal as f64,
            detail: format!(
                "{} support / {} resistance levels",
                report.support.len(),
                report.resistance.len()
            ),
        });
    }

    rows
}

/// Write one signal row per event to `path`.
pub fn write_signals_csv(reports: &[TickerReport], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut count = 0usize;
    for report in reports {
        for row in signal_rows(report) {
            writer
                .serialize(&row)
                .with_context(|| format!("failed to write signal row for {}", row.ticker))?;
            count += 1;
        }
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    info!(path = %path.display(), rows = count, "signals.csv written");
    Ok(())
}

/// Write the full reports as pretty JSON, atomically (tmp + rename).
pub fn write_summary_json(reports: &[TickerReport], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let content =
        serde_json::to_string_pretty(reports).context("failed to serialise scan reports")?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp summary to {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp summary to {}", path.display()))?;

    info!(path = %path.display(), tickers = reports.len(), "summary.json written");
    Ok(())
}

/// Tally the run and log the totals.
pub fn summarize(outcome: &ScanOutcome) -> ScanSummary {
    let mut summary = ScanSummary {
        tickers_scanned: outcome.reports.len(),
        tickers_skipped: outcome.skipped,
        ..ScanSummary::default()
    };

    for report in &outcome.reports {
        summary.crossovers += report.crossovers.len();
        summary.gaps += report.recent_gaps.len();
        summary.patterns +=
            report.bull_flags + report.bear_flags + report.bull_pennants + report.bear_pennants;
        summary.channels += usize::from(report.channel.is_some());
    }

    info!(
        scanned = summary.tickers_scanned,
        skipped = summary.tickers_skipped,
        crossovers = summary.crossovers,
        gaps = summary.gaps,
        patterns = summary.patterns,
        channels = summary.channels,
        "scan summary"
    );
    summary
}

/// Write both artifacts into `report_dir`, creating it if needed.
pub fn write_reports(outcome: &ScanOutcome, report_dir: impl AsRef<Path>) -> Result<ScanSummary> {
    let dir = report_dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report dir {}", dir.display()))?;

    write_signals_csv(&outcome.reports, dir.join("signals.csv"))?;
    write_summary_json(&outcome.reports, dir.join("summary.json"))?;
    Ok(summarize(outcome))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::hull::HullCrossover;
    use crate::patterns::Gap;
    use crate::types::Direction;

    fn report_with_events() -> TickerReport {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        TickerReport {
            ticker: "TEST".to_string(),
            last_date: date,
            last_close: 101.5,
            atr: Some(2.0),
            atr_pct: Some(1.97),
            annualized_vol: Some(0.25),
            beta: Some(1.1),
            percent_change: Some(12.0),
            crossovers: vec![HullCrossover {
                date,
                direction: Direction::Bullish,
                confirm_level: 100.0,
            }],
            recent_gaps: vec![Gap {
                date,
                direction: Direction::Bearish,
                size: 0.012,
                index: 99,
            }],
            bull_flags: 1,
            bear_flags: 0,
            bull_pennants: 0,
            bear_pennants: 0,
            latest_pattern: None,
            support: vec![95.0],
            resistance: vec![110.0],
            sr_signal: 1,
            pivot_levels: Vec::new(),
            channel: None,
        }
    }

    #[test]
    fn rows_cover_every_event() {
        let rows = signal_rows(&report_with_events());
        let kinds: Vec<&str> = rows.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["hull_crossover", "gap", "sr_penetration"]);
        assert_eq!(rows[0].direction, "Bullish");
        assert_eq!(rows[1].direction, "Bearish");
    }

    #[test]
    fn quiet_report_yields_no_rows() {
        let mut report = report_with_events();
        report.crossovers.clear();
        report.recent_gaps.clear();
        report.sr_signal = 0;
        assert!(signal_rows(&report).is_empty());
    }

    #[test]
    fn writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = ScanOutcome {
            reports: vec![report_with_events()],
            skipped: 2,
        };

        let summary = write_reports(&outcome, dir.path()).unwrap();
        assert_eq!(summary.tickers_scanned, 1);
        assert_eq!(summary.tickers_skipped, 2);
        assert_eq!(summary.crossovers, 1);
        assert_eq!(summary.gaps, 1);
        assert_eq!(summary.patterns, 1);

        let csv_text = std::fs::read_to_string(dir.path().join("signals.csv")).unwrap();
        assert!(csv_text.starts_with("ticker,date,kind,direction,value,detail"));
        assert!(csv_text.contains("hull_crossover"));

        let json_text = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(parsed[0]["ticker"], "TEST");
        assert_eq!(parsed[0]["sr_signal"], 1);
    }
}
