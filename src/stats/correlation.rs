use statrs::distribution::{ContinuousCDF, StudentsT};

/// Average-tie ranks for a value array.
///
/// Tied values receive the mean of the rank positions they span, e.g.
/// `[10, 20, 20, 30]` ranks as `[1, 2.5, 2.5, 4]`.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < indices.len() {
        let start = i;
        let value = values[indices[i]];
        i += 1;
        while i < indices.len() && values[indices[i]] == value {
            i += 1;
        }
        let end = i;
        let avg_rank = (start + end - 1) as f64 / 2.0 + 1.0;
        for idx in &indices[start..end] {
            out[*idx] = avg_rank;
        }
    }
    out
}

/// Pearson correlation of two equal-length arrays.
///
/// Returns `None` when either array has zero variance: a degenerate series
/// has an undefined correlation, never 0.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut sum_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        sum_x += xi;
        sum_y += yi;
        sum_x2 += xi * xi;
        sum_y2 += yi * yi;
        sum_xy += xi * yi;
    }
    let denom_x = n * sum_x2 - sum_x * sum_x;
    let denom_y = n * sum_y2 - sum_y * sum_y;
    let denom = (denom_x * denom_y).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    let r = (n * sum_xy - sum_x * sum_y) / denom;
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson on the rank-transformed arrays.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&ranks(x), &ranks(y))
}

/// Lag-1 autocorrelation: Pearson between `x[t-1]` and `x[t]`.
///
/// Treats the input as evenly spaced daily values; cheap, and good enough to
/// drive the effective-sample-size correction.
pub fn lag1_autocorr(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let prev = &values[..values.len() - 1];
    let curr = &values[1..];
    pearson(prev, curr)
}

/// Bartlett's effective sample size under lag-1 serial dependence.
///
/// Uses the worse (larger magnitude) of the two series' lag-1
/// autocorrelations: `n_eff = n * (1 - r1) / (1 + r1)`, clamped to `[3, n]`.
/// A smoothly trending series deflates hard; a noisy one keeps `n_eff`
/// close to `n`.
pub fn bartlett_effective_n(n: usize, r1_a: Option<f64>, r1_b: Option<f64>) -> usize {
    if n <= 3 {
        return n;
    }
    let r1 = [r1_a, r1_b]
        .into_iter()
        .flatten()
        .filter(|r| r.is_finite())
        .map(f64::abs)
        .fold(0.0_f64, f64::max)
        .min(0.999_999);
    let n_eff = ((n as f64) * (1.0 - r1) / (1.0 + r1)).floor() as usize;
    n_eff.clamp(3, n)
}

/// Two-sided p-value for a correlation coefficient via a Student-t statistic.
///
/// `n` is the degrees-of-freedom input and is expected to already be the
/// *effective* sample size; passing the raw count overstates significance for
/// autocorrelated daily data.
pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 4 || !r.is_finite() {
        return None;
    }
    let r = r.clamp(-0.999_999_9, 0.999_999_9);
    if r.abs() >= 0.999_999 {
        return Some(f64::MIN_POSITIVE);
    }
    let df = (n as f64) - 2.0;
    let denom = (1.0 - r * r).max(1e-12);
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Some(p.clamp(f64::MIN_POSITIVE, 1.0))
}
