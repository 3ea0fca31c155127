use crate::engine::pair_stats::PairStats;
use crate::stats::partial::partial_rank_correlation;
use crate::types::ConfounderAdjustment;
use chrono::Datelike;

pub const DAY_OF_WEEK: &str = "day_of_week";

/// A confounded correlation survives control when the partial coefficient
/// keeps the raw coefficient's sign and at least this share of its magnitude.
const SURVIVAL_RATIO: f64 = 0.7;

/// Partial rank correlation controlling for day-of-week.
///
/// Weekly routine drives a lot of life-metric structure (weekend sleep,
/// weekday commutes), so it is the default confounder. A pair whose partial
/// coefficient collapses toward zero was likely riding the weekly cycle; it
/// is annotated as weaker evidence, not discarded.
pub fn control_for_day_of_week(stats: &PairStats) -> Option<ConfounderAdjustment> {
    let z: Vec<f64> = stats
        .aligned
        .dates
        .iter()
        .map(|d| d.weekday().num_days_from_monday() as f64)
        .collect();
    let partial = partial_rank_correlation(&stats.aligned.a, &stats.aligned.b, &z)?;
    let raw = stats.result.rho;
    let survives = partial.signum() == raw.signum() && partial.abs() >= SURVIVAL_RATIO * raw.abs();
    Some(ConfounderAdjustment {
        partial_coefficient: partial,
        survives_confounder_control: survives,
        confounder: DAY_OF_WEEK.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::engine::pair_stats::compute_pair_stats;
    use crate::test_support::{continuous_series, dates_from};
    use crate::types::{CandidatePair, Domain};

    #[test]
    fn direct_relationship_survives_day_of_week_control() {
        let cfg = InsightConfig::default();
        let days = dates_from("2026-01-05", 42);
        // Shared aperiodic structure, unrelated to the weekly cycle.
        let a = continuous_series(Domain::Health, "sleep_hours", &days, |i| {
            ((i * 7) % 11) as f64
        });
        let b = continuous_series(Domain::Mood, "mood_score", &days, |i| {
            ((i * 7) % 11) as f64 * 0.8 + ((i * 3) % 4) as f64 * 0.1
        });
        let pair = CandidatePair {
            a: a.id.clone(),
            b: b.id.clone(),
            check_time_lag: false,
        };
        let stats = compute_pair_stats(pair, &a, &b, &cfg).unwrap();
        let adj = control_for_day_of_week(&stats).unwrap();
        assert!(adj.survives_confounder_control, "partial = {}", adj.partial_coefficient);
        assert_eq!(adj.confounder, DAY_OF_WEEK);
    }

    #[test]
    fn weekly_cycle_driven_pair_is_flagged() {
        let cfg = InsightConfig::default();
        let days = dates_from("2026-01-05", 42);
        // Both metrics are pure functions of the weekday, with distinct
        // small perturbations so neither is degenerate.
        let a = continuous_series(Domain::Health, "sleep_hours", &days, |i| {
            (i % 7) as f64 + ((i * 5) % 3) as f64 * 0.01
        });
        let b = continuous_series(Domain::Mood, "mood_score", &days, |i| {
            (i % 7) as f64 * 2.0 + ((i * 11) % 4) as f64 * 0.01
        });
        let pair = CandidatePair {
            a: a.id.clone(),
            b: b.id.clone(),
            check_time_lag: false,
        };
        let stats = compute_pair_stats(pair, &a, &b, &cfg).unwrap();
        assert!(stats.result.rho > 0.8);
        let adj = control_for_day_of_week(&stats).unwrap();
        assert!(
            adj.partial_coefficient.abs() < stats.result.rho.abs(),
            "partial = {}, raw = {}",
            adj.partial_coefficient,
            stats.result.rho
        );
        assert!(!adj.survives_confounder_control);
    }
}
