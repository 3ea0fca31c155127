use crate::config::InsightConfig;
use crate::types::CorrelationResult;

/// Final accept/reject rule, applied after the batch FDR correction.
///
/// All gates must hold: raw p below the per-test level, BH-adjusted p below
/// the FDR level, an effect size large enough to matter in practice, and an
/// effective sample size large enough to trust. Pairs failing any gate are
/// dropped silently. Since `adjusted >= raw`, the raw gate only binds when
/// `min_p_value` is set tighter than `fdr_level`.
pub fn is_significant(result: &CorrelationResult, cfg: &InsightConfig) -> bool {
    result.raw_p < cfg.min_p_value
        && result.adjusted_p < cfg.fdr_level
        && result.effect_size.abs() >= cfg.min_effect_size
        && result.effective_sample_size >= cfg.min_sample_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CorrelationKind;

    fn result(adjusted_p: f64, effect: f64, n_eff: usize) -> CorrelationResult {
        CorrelationResult {
            kind: CorrelationKind::Rank,
            rho: effect,
            pearson_r: effect,
            raw_p: adjusted_p / 2.0,
            adjusted_p,
            sample_size: n_eff * 2,
            effective_sample_size: n_eff,
            effect_size: effect,
            significant: false,
        }
    }

    #[test]
    fn every_gate_must_hold() {
        let cfg = InsightConfig::default();
        assert!(is_significant(&result(0.01, 0.5, 30), &cfg));
        assert!(is_significant(&result(0.01, -0.5, 30), &cfg));
        // Each gate failing alone rejects.
        assert!(!is_significant(&result(0.06, 0.5, 30), &cfg));
        assert!(!is_significant(&result(0.01, 0.2, 30), &cfg));
        assert!(!is_significant(&result(0.01, 0.5, 13), &cfg));
    }

    #[test]
    fn boundary_values_reject() {
        let cfg = InsightConfig::default();
        // p must be strictly below the level; effect and n_eff are inclusive.
        assert!(!is_significant(&result(0.05, 0.5, 30), &cfg));
        assert!(is_significant(&result(0.049, 0.3, 14), &cfg));
    }

    #[test]
    fn tightened_fdr_level_rejects_previously_accepted_pairs() {
        let accepted = result(0.04, 0.5, 30);
        let cfg = InsightConfig::default();
        assert!(is_significant(&accepted, &cfg));

        let strict = InsightConfig {
            fdr_level: 0.01,
            ..InsightConfig::default()
        };
        assert!(!is_significant(&accepted, &strict));
    }

    #[test]
    fn raw_p_gate_binds_when_set_tighter_than_the_fdr_level() {
        // raw_p is adjusted_p / 2 = 0.02, above the tightened per-test level.
        let r = result(0.04, 0.5, 30);
        let cfg = InsightConfig {
            min_p_value: 0.01,
            ..InsightConfig::default()
        };
        assert!(!is_significant(&r, &cfg));
    }
}
