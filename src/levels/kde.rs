// =============================================================================
// Weighted Gaussian Kernel Density Estimation
// =============================================================================
//
// A small 1-D KDE used to build the market profile of a price window.
// Follows the scipy `gaussian_kde(bw_method=f, weights=w)` convention: the
// effective bandwidth is `f × weighted std-dev of the data`, and weights are
// normalized to sum to 1.
// =============================================================================

/// Weighted Gaussian KDE over a fixed sample.
#[derive(Debug, Clone)]
pub struct WeightedKde {
    data: Vec<f64>,
    /// Normalized weights (sum to 1).
    weights: Vec<f64>,
    bandwidth: f64,
}

impl WeightedKde {
    /// Build a KDE with bandwidth `factor × weighted std`.
    ///
    /// Returns `None` when the sample is empty, the weights are degenerate
    /// (non-positive sum), or the bandwidth collapses to zero (flat data or
    /// zero factor).
    pub fn new(data: &[f64], weights: &[f64], factor: f64) -> Option<Self> {
        if data.is_empty() || data.len() != weights.len() {
            return None;
        }
        let weight_sum: f64 = weights.iter().sum();
        if !(weight_sum > 0.0) {
            return None;
        }

        let weights: Vec<f64> = weights.iter().map(|w| w / weight_sum).collect();

        let mean: f64 = data
            .iter()
            .zip(&weights)
            .map(|(x, w)| x * w)
            .sum();
        let var: f64 = data
            .iter()
            .zip(&weights)
            .map(|(x, w)| w * (x - mean) * (x - mean))
            .sum();
        let bandwidth = factor * var.sqrt();
        if !(bandwidth > 0.0) || !bandwidth.is_finite() {
            return None;
        }

        Some(Self {
            data: data.to_vec(),
            weights,
            bandwidth,
        })
    }

    /// Density estimate at a single point.
    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = 1.0 / (self.bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        self.data
            .iter()
            .zip(&self.weights)
            .map(|(xi, w)| {
                let z = (x - xi) / self.bandwidth;
                w * norm * (-0.5 * z * z).exp()
            })
            .sum()
    }

    /// Density estimate over every grid point.
    pub fn evaluate_grid(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.evaluate(x)).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_mismatched_inputs() {
        assert!(WeightedKde::new(&[], &[], 1.0).is_none());
        assert!(WeightedKde::new(&[1.0, 2.0], &[1.0], 1.0).is_none());
    }

    #[test]
    fn rejects_flat_data() {
        // Zero variance -> zero bandwidth -> no estimate.
        let data = vec![5.0; 20];
        let weights = vec![1.0; 20];
        assert!(WeightedKde::new(&data, &weights, 1.0).is_none());
    }

    #[test]
    fn rejects_zero_weights() {
        let data = vec![1.0, 2.0, 3.0];
        let weights = vec![0.0, 0.0, 0.0];
        assert!(WeightedKde::new(&data, &weights, 1.0).is_none());
    }

    #[test]
    fn density_peaks_at_data_mass() {
        let data = vec![1.0, 1.1, 0.9, 1.0, 5.0];
        let weights = vec![1.0; 5];
        let kde = WeightedKde::new(&data, &weights, 0.2).unwrap();
        assert!(
            kde.evaluate(1.0) > kde.evaluate(3.0),
            "density should concentrate where the data sits"
        );
    }

    #[test]
    fn density_integrates_to_one() {
        let data = vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0];
        let weights = vec![1.0; 6];
        let kde = WeightedKde::new(&data, &weights, 0.5).unwrap();

        // Trapezoid over a wide grid.
        let lo = -10.0;
        let hi = 13.0;
        let steps = 2_000;
        let dx = (hi - lo) / steps as f64;
        let mut integral = 0.0;
        for k in 0..steps {
            let x0 = lo + k as f64 * dx;
            integral += 0.5 * (kde.evaluate(x0) + kde.evaluate(x0 + dx)) * dx;
        }
        assert!(
            (integral - 1.0).abs() < 1e-3,
            "KDE should integrate to ~1, got {integral}"
        );
    }

    #[test]
    fn weights_shift_the_mass() {
        let data = vec![0.0, 10.0];
        // Heavy weight on the right-hand point.
        let kde = WeightedKde::new(&data, &[0.1, 0.9], 0.5).unwrap();
        assert!(kde.evaluate(10.0) > kde.evaluate(0.0));
    }
}
