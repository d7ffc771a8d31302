// =============================================================================
// Perceptually Important Points (PIPs)
// =============================================================================
//
// Greedy extraction of the k most perceptually important points of a price
// window. Start with the two endpoints; repeatedly insert the interior point
// with the maximum distance from the straight line joining its adjacent
// already-selected points.
//
// Three distance measures are supported; the flag detector uses the vertical
// distance, which is both the cheapest and the least sensitive to the x/y
// scale mismatch between bar indices and prices.
// =============================================================================

/// How the distance between a candidate point and the line through its
/// adjacent PIPs is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMeasure {
    /// Sum of euclidean distances to both adjacent PIPs.
    Euclidean,
    /// Perpendicular distance to the connecting line.
    Perpendicular,
    /// Vertical (price-axis) distance to the connecting line.
    Vertical,
}

/// A selected point: (index into the input window, price at that index).
pub type Pip = (usize, f64);

/// Extract `n_pips` perceptually important points from `data`.
///
/// The result is ordered by index and always contains both endpoints.
/// Returns an empty vec when `n_pips < 2`, the window has fewer than two
/// points, or `n_pips` exceeds the window length.
pub fn find_pips(data: &[f64], n_pips: usize, measure: DistanceMeasure) -> Vec<Pip> {
    if n_pips < 2 || data.len() < 2 || n_pips > data.len() {
        return Vec::new();
    }

    let mut pips_x: Vec<usize> = vec![0, data.len() - 1];
    let mut pips_y: Vec<f64> = vec![data[0], data[data.len() - 1]];

    for curr_point in 2..n_pips {
        let mut max_dist = 0.0;
        let mut max_dist_idx: Option<usize> = None;
        let mut insert_at = 0;

        // Walk every adjacent pair of already-selected PIPs and find the
        // interior point furthest from the segment between them.
        for k in 0..curr_point - 1 {
            let (lx, rx) = (pips_x[k], pips_x[k + 1]);
            let (ly, ry) = (pips_y[k], pips_y[k + 1]);

            let time_diff = (rx - lx) as f64;
            let price_diff = ry - ly;
            let slope = price_diff / time_diff;
            let intercept = ly - lx as f64 * slope;

            for i in lx + 1..rx {
                let d = match measure {
                    DistanceMeasure::Euclidean => {
                        let left = ((lx as f64 - i as f64).powi(2)
                            + (ly - data[i]).powi(2))
                        .sqrt();
                        let right = ((rx as f64 - i as f64).powi(2)
                            + (ry - data[i]).powi(2))
                        .sqrt();
                        left + right
                    }
                    DistanceMeasure::Perpendicular => {
                        ((slope * i as f64 + intercept) - data[i]).abs()
                            / (slope * slope + 1.0).sqrt()
                    }
                    DistanceMeasure::Vertical => {
                        ((slope * i as f64 + intercept) - data[i]).abs()
                    }
                };

                if d > max_dist {
                    max_dist = d;
                    max_dist_idx = Some(i);
                    insert_at = k + 1;
                }
            }
        }

        // Every interior point already selected (flat or tiny window).
        let Some(idx) = max_dist_idx else {
            break;
        };
        pips_x.insert(insert_at, idx);
        pips_y.insert(insert_at, data[idx]);
    }

    pips_x.into_iter().zip(pips_y).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(find_pips(&[1.0], 2, DistanceMeasure::Vertical).is_empty());
        assert!(find_pips(&[1.0, 2.0, 3.0], 1, DistanceMeasure::Vertical).is_empty());
        assert!(find_pips(&[1.0, 2.0], 5, DistanceMeasure::Vertical).is_empty());
    }

    #[test]
    fn keeps_both_endpoints() {
        let data: Vec<f64> = (0..20).map(|i| (i as f64 * 0.9).sin()).collect();
        for measure in [
            DistanceMeasure::Euclidean,
            DistanceMeasure::Perpendicular,
            DistanceMeasure::Vertical,
        ] {
            let pips = find_pips(&data, 5, measure);
            assert_eq!(pips.len(), 5);
            assert_eq!(pips[0].0, 0);
            assert_eq!(pips[4].0, data.len() - 1);
        }
    }

    #[test]
    fn indices_are_sorted_and_unique() {
        let data: Vec<f64> = (0..40).map(|i| ((i * i) % 17) as f64).collect();
        let pips = find_pips(&data, 7, DistanceMeasure::Vertical);
        for pair in pips.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn v_shape_vertex_is_third_pip() {
        // Prices fall to a vertex at index 10 then recover; the vertex is the
        // single most important interior point.
        let data: Vec<f64> = (0..21)
            .map(|i| (i as f64 - 10.0).abs() + 5.0)
            .collect();
        let pips = find_pips(&data, 3, DistanceMeasure::Vertical);
        assert_eq!(pips.len(), 3);
        assert_eq!(pips[1].0, 10);
        assert!((pips[1].1 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn prices_match_input_data() {
        let data: Vec<f64> = (0..30).map(|i| (i as f64 * 0.5).cos() * 10.0).collect();
        let pips = find_pips(&data, 6, DistanceMeasure::Euclidean);
        for (x, y) in pips {
            assert!((data[x] - y).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_series_stops_early() {
        // All interior distances are zero; the extraction keeps only the
        // endpoints rather than inventing points.
        let data = vec![5.0; 12];
        let pips = find_pips(&data, 5, DistanceMeasure::Vertical);
        assert_eq!(pips.len(), 2);
    }
}
