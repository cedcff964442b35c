//! Local-maximum peak finding with minimum spacing

/// Indices of local maxima in `data`, in ascending order.
///
/// A peak is a sample strictly greater than its left neighbour and greater
/// than the next differing sample on its right; flat tops report their
/// midpoint (left-biased). The first and last samples are never peaks.
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }

    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            // Walk across a possible plateau
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                let right_edge = ahead - 1;
                peaks.push((i + right_edge) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    peaks
}

/// Local maxima with at least `min_distance` samples between kept peaks.
///
/// Higher peaks win; among equal heights the later peak in index order is
/// considered first. `min_distance <= 1` keeps every local maximum.
pub fn find_peaks(data: &[f64], min_distance: usize) -> Vec<usize> {
    let peaks = local_maxima(data);
    if min_distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    // Visit by height, highest first
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| data[peaks[a]].total_cmp(&data[peaks[b]]).then(a.cmp(&b)));
    order.reverse();

    let mut keep = vec![true; peaks.len()];
    for &idx in &order {
        if !keep[idx] {
            continue;
        }

        let mut j = idx;
        while j > 0 && peaks[idx] - peaks[j - 1] < min_distance {
            keep[j - 1] = false;
            j -= 1;
        }

        let mut j = idx + 1;
        while j < peaks.len() && peaks[j] - peaks[idx] < min_distance {
            keep[j] = false;
            j += 1;
        }
    }

    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let data = [0.0, 1.0, 0.0, 2.0, 0.0, 1.5, 0.0];
        assert_eq!(local_maxima(&data), vec![1, 3, 5]);
    }

    #[test]
    fn test_edges_are_not_peaks() {
        assert!(local_maxima(&[3.0, 2.0, 1.0]).is_empty());
        assert!(local_maxima(&[1.0, 2.0, 3.0]).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_plateau_midpoint() {
        let data = [0.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(local_maxima(&data), vec![2]);

        // Even-width plateau rounds down
        let data = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(local_maxima(&data), vec![1]);

        // Plateau running into the edge is not a peak
        let data = [0.0, 1.0, 1.0, 1.0];
        assert!(local_maxima(&data).is_empty());

        // Shoulder that keeps rising is not a peak
        let data = [0.0, 1.0, 1.0, 2.0, 0.0];
        assert_eq!(local_maxima(&data), vec![3]);
    }

    #[test]
    fn test_distance_keeps_higher_peak() {
        let data = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&data, 1), vec![1, 3, 5, 9]);
        assert_eq!(find_peaks(&data, 3), vec![3, 9]);
        assert_eq!(find_peaks(&data, 7), vec![3]);
    }
}
