use super::correlation::{pearson, ranks};

/// First-order partial rank correlation of x and y, controlling for z.
///
/// All three arrays are rank-transformed, then
/// `r_xy.z = (r_xy - r_xz * r_yz) / sqrt((1 - r_xz^2)(1 - r_yz^2))`.
///
/// Returns `None` when any pairwise correlation is undefined or when either
/// control correlation is so close to 1 that the denominator degenerates
/// (z explains x or y almost completely).
pub fn partial_rank_correlation(x: &[f64], y: &[f64], z: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() != z.len() || x.len() < 4 {
        return None;
    }
    let rx = ranks(x);
    let ry = ranks(y);
    let rz = ranks(z);

    let r_xy = pearson(&rx, &ry)?;
    let r_xz = pearson(&rx, &rz)?;
    let r_yz = pearson(&ry, &rz)?;

    let denom = ((1.0 - r_xz * r_xz) * (1.0 - r_yz * r_yz)).sqrt();
    if denom < 1e-6 || !denom.is_finite() {
        return None;
    }
    let partial = (r_xy - r_xz * r_yz) / denom;
    if !partial.is_finite() {
        return None;
    }
    Some(partial.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::correlation::spearman;

    #[test]
    fn shared_trend_collapses_under_partial_correlation() {
        // x and y are both driven by the same trend z plus unrelated
        // periodic structure; their raw correlation is high, but controlling
        // for z removes most of it.
        let n = 40;
        let z: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let x: Vec<f64> = (0..n).map(|i| i as f64 + 4.0 * ((i % 3) as f64)).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| {
                let wobble = match i % 4 {
                    0 => 0.0,
                    1 => 2.0,
                    2 => 0.0,
                    _ => -2.0,
                };
                i as f64 + 4.0 * wobble
            })
            .collect();

        let raw = spearman(&x, &y).unwrap();
        let partial = partial_rank_correlation(&x, &y, &z).unwrap();
        assert!(raw > 0.8, "raw = {raw}");
        assert!(partial.abs() < 0.5, "partial = {partial}");
        assert!(partial.abs() < raw.abs());
    }

    #[test]
    fn unrelated_control_leaves_correlation_intact() {
        let n = 30;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| 2.0 * i as f64 + 1.0).collect();
        // Day-of-week style cyclic control, unrelated to the trend.
        let z: Vec<f64> = (0..n).map(|i| (i % 7) as f64).collect();

        let raw = spearman(&x, &y).unwrap();
        let partial = partial_rank_correlation(&x, &y, &z).unwrap();
        assert!((raw - 1.0).abs() < 0.001);
        assert!(partial > 0.9, "partial = {partial}");
    }

    #[test]
    fn degenerate_control_returns_none() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..10).map(|i| (i * 2) as f64).collect();
        // z identical to x: control correlation is 1, denominator collapses.
        assert_eq!(partial_rank_correlation(&x, &y, &x), None);
    }
}
