use crate::series::AlignedPair;
use crate::types::{GroupStats, WithWithoutResult};

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn group_stats(values: &[f64]) -> GroupStats {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    GroupStats {
        mean,
        median: median(values),
        count,
    }
}

/// Two-group contrast for occurrence-type pairs: outcome on days the
/// behavior happened vs days it did not.
///
/// `occurrence_is_a` selects which side of the aligned pair is the
/// occurrence metric; the other side is the outcome. Returns `None` unless
/// both groups are non-empty. Percent difference is defined as 0 when the
/// without-group mean is 0 (never Inf/NaN).
pub fn compare_with_without(aligned: &AlignedPair, occurrence_is_a: bool) -> Option<WithWithoutResult> {
    let (occurrence, outcome) = if occurrence_is_a {
        (&aligned.a, &aligned.b)
    } else {
        (&aligned.b, &aligned.a)
    };

    let mut with_values: Vec<f64> = Vec::new();
    let mut without_values: Vec<f64> = Vec::new();
    for (occ, out) in occurrence.iter().zip(outcome.iter()) {
        if *occ > 0.0 {
            with_values.push(*out);
        } else {
            without_values.push(*out);
        }
    }
    if with_values.is_empty() || without_values.is_empty() {
        return None;
    }

    let with_group = group_stats(&with_values);
    let without_group = group_stats(&without_values);
    let absolute_difference = with_group.mean - without_group.mean;
    let percent_difference = if without_group.mean == 0.0 {
        0.0
    } else {
        absolute_difference / without_group.mean.abs() * 100.0
    };

    Some(WithWithoutResult {
        with_group,
        without_group,
        absolute_difference,
        percent_difference,
    })
}
