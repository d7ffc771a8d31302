// =============================================================================
// Peak Finding
// =============================================================================
//
// Local-maximum detection with topographic prominence, matching the usual
// signal-processing definition: a peak's prominence is its height above the
// higher of the two valley floors separating it from taller terrain (or from
// the signal edge). An optional minimum-distance filter keeps the most
// prominent peak of any crowded group.
// =============================================================================

/// A detected local maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub prominence: f64,
}

/// Find local maxima in `signal` with prominence at least `min_prominence`,
/// keeping peaks at least `min_distance` samples apart (most prominent wins).
pub fn find_peaks(signal: &[f64], min_prominence: f64, min_distance: usize) -> Vec<Peak> {
    let mut peaks: Vec<Peak> = local_maxima(signal)
        .into_iter()
        .map(|index| Peak {
            index,
            prominence: prominence(signal, index),
        })
        .filter(|p| p.prominence >= min_prominence)
        .collect();

    if min_distance > 1 {
        peaks = enforce_distance(peaks, min_distance);
    }
    peaks.sort_by_key(|p| p.index);
    peaks
}

/// Indices of strict local maxima. Plateau tops count at their first sample.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut maxima = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if signal[i] > signal[i - 1] {
            // Skip over a flat top, then check the far edge.
            let mut j = i;
            while j + 1 < n && signal[j + 1] == signal[i] {
                j += 1;
            }
            if j + 1 < n && signal[j + 1] < signal[i] {
                maxima.push(i);
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }
    maxima
}

/// Topographic prominence of the peak at `index`.
fn prominence(signal: &[f64], index: usize) -> f64 {
    let height = signal[index];

    // Walk left until terrain higher than the peak (or the edge), tracking
    // the lowest point crossed. Same on the right. The prominence is the
    // height above the higher of the two valley floors.
    let mut left_min = height;
    let mut i = index;
    while i > 0 {
        i -= 1;
        if signal[i] > height {
            break;
        }
        left_min = left_min.min(signal[i]);
    }

    let mut right_min = height;
    let mut j = index;
    while j + 1 < signal.len() {
        j += 1;
        if signal[j] > height {
            break;
        }
        right_min = right_min.min(signal[j]);
    }

    height - left_min.max(right_min)
}

/// Greedy distance filter: most prominent peaks claim their neighbourhood
/// first.
fn enforce_distance(mut peaks: Vec<Peak>, min_distance: usize) -> Vec<Peak> {
    peaks.sort_by(|a, b| b.prominence.partial_cmp(&a.prominence).unwrap());
    let mut kept: Vec<Peak> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        let crowded = kept
            .iter()
            .any(|k| peak.index.abs_diff(k.index) < min_distance);
        if !crowded {
            kept.push(peak);
        }
    }
    kept
}
