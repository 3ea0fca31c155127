use crate::config::InsightConfig;
use crate::error::PairSkip;
use crate::series::{align, AlignedPair, DailySeries};
use crate::stats::correlation::{
    bartlett_effective_n, correlation_p_value, lag1_autocorr, pearson, spearman,
};
use crate::types::{CandidatePair, CorrelationKind, CorrelationResult};

/// Stage A output for one candidate pair: aligned values plus the raw
/// (pre-FDR) correlation statistics.
#[derive(Debug, Clone)]
pub struct PairStats {
    pub pair: CandidatePair,
    pub aligned: AlignedPair,
    pub result: CorrelationResult,
}

fn has_variance(values: &[f64]) -> bool {
    values
        .first()
        .map(|first| values.iter().any(|v| v != first))
        .unwrap_or(false)
}

/// Align one pair and compute its correlation, autocorrelation-deflated
/// effective sample size, and raw p-value.
///
/// The p-value uses `n_eff`, not `n`, as the degrees-of-freedom input; the
/// batch FDR correction is applied on top of that later, never the other way
/// around.
pub fn compute_pair_stats(
    pair: CandidatePair,
    a: &DailySeries,
    b: &DailySeries,
    cfg: &InsightConfig,
) -> Result<PairStats, PairSkip> {
    let aligned = align(a, b);
    let n = aligned.len();
    if n < cfg.min_sample_size {
        return Err(PairSkip::InsufficientData {
            actual: n,
            required: cfg.min_sample_size,
        });
    }
    if !has_variance(&aligned.a) {
        return Err(PairSkip::DegenerateSeries {
            metric: pair.a.key(),
        });
    }
    if !has_variance(&aligned.b) {
        return Err(PairSkip::DegenerateSeries {
            metric: pair.b.key(),
        });
    }

    let rho = spearman(&aligned.a, &aligned.b).ok_or_else(|| PairSkip::DegenerateSeries {
        metric: pair.a.key(),
    })?;
    let pearson_r = pearson(&aligned.a, &aligned.b).ok_or_else(|| PairSkip::DegenerateSeries {
        metric: pair.b.key(),
    })?;

    let r1_a = lag1_autocorr(&aligned.a);
    let r1_b = lag1_autocorr(&aligned.b);
    let n_eff = bartlett_effective_n(n, r1_a, r1_b);

    let effect_size = match cfg.correlation {
        CorrelationKind::Rank => rho,
        CorrelationKind::Linear => pearson_r,
    };
    let raw_p = correlation_p_value(effect_size, n_eff).ok_or(PairSkip::InsufficientData {
        actual: n_eff,
        required: cfg.min_sample_size,
    })?;

    Ok(PairStats {
        pair,
        aligned,
        result: CorrelationResult {
            kind: cfg.correlation,
            rho,
            pearson_r,
            raw_p,
            // Placeholder until the batch correction runs; BH only ever
            // raises it.
            adjusted_p: raw_p,
            sample_size: n,
            effective_sample_size: n_eff,
            effect_size,
            significant: false,
        },
    })
}
