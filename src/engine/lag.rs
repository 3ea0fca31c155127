use crate::config::InsightConfig;
use crate::series::{align_with_lag, DailySeries};
use crate::stats::correlation::{pearson, spearman};
use crate::types::{CorrelationKind, LagDirection, LagResult};

/// Directional time-lag search.
///
/// Re-correlates the pair with one series shifted by 1..max lag days in both
/// directions ("A today predicts B in `lag` days" and the reverse). A lagged
/// result replaces the same-day finding only when its absolute effect size is
/// strictly larger; ties keep the shorter, same-day-first interpretation.
pub fn best_lag(
    a: &DailySeries,
    b: &DailySeries,
    same_day_effect: f64,
    cfg: &InsightConfig,
) -> LagResult {
    let mut best = LagResult {
        direction: LagDirection::SameDay,
        lag_days: 0,
        effect_size: same_day_effect,
    };

    for lag in 1..=i64::from(cfg.max_time_lag_days) {
        for (direction, aligned) in [
            (LagDirection::ALeadsB, align_with_lag(a, b, lag)),
            (LagDirection::BLeadsA, align_with_lag(b, a, lag)),
        ] {
            if aligned.len() < cfg.min_sample_size {
                continue;
            }
            let r = match cfg.correlation {
                CorrelationKind::Rank => spearman(&aligned.a, &aligned.b),
                CorrelationKind::Linear => pearson(&aligned.a, &aligned.b),
            };
            let Some(r) = r else {
                continue;
            };
            if r.abs() > best.effect_size.abs() {
                best = LagResult {
                    direction,
                    lag_days: lag as u32,
                    effect_size: r,
                };
            }
        }
    }

    best
}
