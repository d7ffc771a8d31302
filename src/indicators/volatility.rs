// =============================================================================
// Return Volatility and Beta
// =============================================================================
//
// Daily returns are simple percent changes of the close. Realized volatility
// is the sample standard deviation of daily returns; the annualized figure
// assumes 252 trading days. Beta is cov(asset, benchmark) / var(benchmark)
// over aligned return pairs.
// =============================================================================

/// Simple percent-change returns of a close series (`len - 1` entries).
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    if closes.len() < 2 {
        return Vec::new();
    }
    closes
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Sample standard deviation of a return series.
///
/// Returns `None` with fewer than two observations or non-finite input.
pub fn realized(returns: &[f64]) -> Option<f64> {
    let n = returns.len();
    if n < 2 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / n as f64;
    let var = returns
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<f64>()
        / (n - 1) as f64;
    let sd = var.sqrt();
    sd.is_finite().then_some(sd)
}

/// Annualized volatility: daily std-dev scaled by sqrt(252).
pub fn annualized(returns: &[f64]) -> Option<f64> {
    realized(returns).map(|sd| sd * 252_f64.sqrt())
}

/// Beta of an asset against a benchmark return series.
///
/// The two series are aligned on their trailing overlap (the scripts align
/// rows and drop the unmatched head). Returns `None` when the overlap is
/// shorter than two observations or the benchmark variance is zero.
pub fn beta(asset_returns: &[f64], benchmark_returns: &[f64]) -> Option<f64> {
    let n = asset_returns.len().min(benchmark_returns.len());
    if n < 2 {
        return None;
    }
    let a = &asset_returns[asset_returns.len() - n..];
    let b = &benchmark_returns[benchmark_returns.len() - n..];

    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        cov += (a[i] - mean_a) * (b[i] - mean_b);
        var_b += (b[i] - mean_b) * (b[i] - mean_b);
    }
    cov /= (n - 1) as f64;
    var_b /= (n - 1) as f64;

    if var_b == 0.0 {
        return None;
    }
    let beta = cov / var_b;
    beta.is_finite().then_some(beta)
}

/// Percent change from the first to the last close.
pub fn percent_change(closes: &[f64]) -> Option<f64> {
    let first = *closes.first()?;
    let last = *closes.last()?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_of_short_series_empty() {
        assert!(daily_returns(&[100.0]).is_empty());
    }

    #[test]
    fn returns_known_values() {
        let r = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] - (-0.10)).abs() < 1e-12);
    }

    #[test]
    fn realized_vol_of_constant_returns_is_zero() {
        let r = vec![0.01; 50];
        assert!(realized(&r).unwrap() < 1e-12);
    }

    #[test]
    fn realized_vol_is_non_negative() {
        let r: Vec<f64> = (0..100).map(|i| ((i as f64) * 0.3).sin() * 0.02).collect();
        assert!(realized(&r).unwrap() >= 0.0);
    }

    #[test]
    fn annualized_scales_by_sqrt_252() {
        let r: Vec<f64> = (0..100).map(|i| ((i as f64) * 0.3).sin() * 0.02).collect();
        let daily = realized(&r).unwrap();
        let annual = annualized(&r).unwrap();
        assert!((annual - daily * 252_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn beta_of_identical_series_is_one() {
        let r: Vec<f64> = (0..100).map(|i| ((i as f64) * 0.7).sin() * 0.01).collect();
        let b = beta(&r, &r).unwrap();
        assert!((b - 1.0).abs() < 1e-9, "beta of self should be 1, got {b}");
    }

    #[test]
    fn beta_of_doubled_series_is_two() {
        let bench: Vec<f64> = (0..100).map(|i| ((i as f64) * 0.7).sin() * 0.01).collect();
        let asset: Vec<f64> = bench.iter().map(|r| r * 2.0).collect();
        let b = beta(&asset, &bench).unwrap();
        assert!((b - 2.0).abs() < 1e-9);
    }

    #[test]
    fn beta_flat_benchmark_is_none() {
        let asset = vec![0.01, -0.02, 0.03];
        let bench = vec![0.0, 0.0, 0.0];
        assert!(beta(&asset, &bench).is_none());
    }

    #[test]
    fn percent_change_round_trip() {
        assert!((percent_change(&[50.0, 100.0]).unwrap() - 100.0).abs() < 1e-12);
        assert!((percent_change(&[100.0, 50.0]).unwrap() + 50.0).abs() < 1e-12);
    }
}
