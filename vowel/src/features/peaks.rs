/// Finds local maxima in `x` with height at least `min_height`, keeping
/// peaks at least `min_distance` indices apart.
///
/// # Algorithm
///
/// 1. A local maximum rises strictly from its left neighbour and falls
///    strictly to its right neighbour. A flat plateau counts once, at its
///    middle index (rounded down). The first and last samples are never
///    peaks.
/// 2. Peaks lower than `min_height` are dropped.
/// 3. Remaining peaks are visited tallest first; each kept peak removes
///    all neighbours closer than `min_distance`. Equal heights are visited
///    lowest index first, so the result is stable for identical input.
///
/// Returns peak indices in ascending order.
pub fn find_peaks(x: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
    let n = x.len();
    if n < 3 {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    let mut i = 1;
    while i < n - 1 {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks.retain(|&p| x[p] >= min_height);

    if min_distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| x[peaks[b]].total_cmp(&x[peaks[a]]).then(a.cmp(&b)));

    let mut keep = vec![true; peaks.len()];
    for &j in &order {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= min_distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= min_distance {
                break;
            }
            keep[k] = false;
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
    fn simple_peaks() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        assert_eq!(find_peaks(&x, 0.0, 1), vec![1, 3, 5]);
    }

    #[test]
    fn edges_are_not_peaks() {
        let x = [5.0, 1.0, 2.0, 1.0, 5.0];
        assert_eq!(find_peaks(&x, 0.0, 1), vec![2]);
    }

    #[test]
    fn plateau_reports_middle() {
        let x = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, 0.0, 1), vec![2]);
        let x = [0.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&x, 0.0, 1), vec![2]);
    }

    #[test]
    fn rising_plateau_is_not_a_peak() {
        let x = [0.0, 1.0, 1.0, 2.0, 0.0];
        assert_eq!(find_peaks(&x, 0.0, 1), vec![3]);
    }

    #[test]
    fn height_filter() {
        let x = [0.0, 1.0, 0.0, 5.0, 0.0, 0.4, 0.0];
        assert_eq!(find_peaks(&x, 0.5, 1), vec![1, 3]);
    }

    #[test]
    fn distance_prefers_taller() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.5, 0.0];
        // 3 suppresses 1 and 5; 10 is far enough away.
        assert_eq!(find_peaks(&x, 0.0, 3), vec![3, 10]);
    }

    #[test]
    fn distance_ties_keep_lowest_index() {
        let x = [0.0, 2.0, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&x, 0.0, 3), vec![1]);
    }

    #[test]
    fn flat_input_has_no_peaks() {
        assert!(find_peaks(&[0.0; 64], 0.0, 20).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.0, 1).is_empty());
    }

    #[test]
    fn deterministic() {
        let x: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64).collect();
        let a = find_peaks(&x, 10.0, 20);
        let b = find_peaks(&x, 10.0, 20);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[1] - w[0] >= 20));
    }
}
