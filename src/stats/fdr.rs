/// Benjamini–Hochberg step-up correction across one run's raw p-values.
///
/// Input: `(key, p)` pairs; output: `key -> adjusted p` (q-value) in
/// `[0, 1]`. `q >= p` always, and q-values are monotone non-decreasing along
/// the p-sorted order.
///
/// This is the pipeline's one global barrier: it needs every raw p-value of
/// the run before any adjusted value is meaningful. BH assumes independence
/// or positive dependence; for daily life metrics that is an approximation,
/// but far better than dozens of uncorrected 0.05 tests.
pub fn bh_adjusted_p(pairs: &[(usize, f64)]) -> Vec<(usize, f64)> {
    let mut sorted: Vec<(usize, f64)> = pairs
        .iter()
        .copied()
        .filter(|(_, p)| p.is_finite() && (0.0..=1.0).contains(p))
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }

    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
    let m = sorted.len() as f64;

    let mut q: Vec<(usize, f64)> = sorted
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, (key, p))| {
            let rank = (idx + 1) as f64;
            (key, (p * m / rank).min(1.0))
        })
        .collect();

    // Running minimum from the largest rank down enforces monotonicity.
    for idx in (0..q.len().saturating_sub(1)).rev() {
        let next = q[idx + 1].1;
        if q[idx].1 > next {
            q[idx].1 = next;
        }
    }

    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bh_keeps_exactly_two_survivors_on_reference_input() {
        let raw = [0.001, 0.01, 0.03, 0.04, 0.05, 0.10, 0.20, 0.50];
        let keyed: Vec<(usize, f64)> = raw.iter().copied().enumerate().collect();
        let mut adjusted = bh_adjusted_p(&keyed);
        adjusted.sort_by_key(|(k, _)| *k);

        let survivors = adjusted.iter().filter(|(_, q)| *q < 0.05).count();
        assert_eq!(survivors, 2);
        assert!(adjusted[0].1 < 0.05);
        assert!(adjusted[1].1 < 0.05);
        for (_, q) in adjusted.iter().skip(2) {
            assert!(*q >= 0.05);
        }

        // Monotone non-decreasing along the sorted raw input (already sorted).
        for w in adjusted.windows(2) {
            assert!(w[0].1 <= w[1].1);
        }
        // Correction never decreases a p-value.
        for ((_, q), p) in adjusted.iter().zip(raw.iter()) {
            assert!(q >= p);
        }
    }

    #[test]
    fn bh_drops_invalid_p_values_and_sizes_m_accordingly() {
        let input = vec![
            (0, f64::INFINITY),
            (1, 0.03),
            (2, -0.25),
            (3, f64::NAN),
            (4, 0.6),
        ];
        let out = bh_adjusted_p(&input);
        assert_eq!(out.len(), 2);
        // m = 2, counting only the valid entries: q = 0.03 * 2 / 1.
        assert_eq!(out[0].0, 1);
        assert!((out[0].1 - 0.06).abs() < 1e-12);
        assert_eq!(out[1].0, 4);
        assert!((out[1].1 - 0.6).abs() < 1e-12);
    }

    #[test]
    fn bh_on_empty_input_is_empty() {
        assert!(bh_adjusted_p(&[]).is_empty());
    }
}
