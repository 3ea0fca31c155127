use crate::config::InsightConfig;
use crate::series::AlignedPair;
use crate::stats::correlation::{pearson, spearman};
use crate::types::{CorrelationKind, TrendDirection, TrendResult};
use chrono::Duration;

/// Windows advance by one week; daily stepping adds noise without insight.
const WINDOW_STEP_DAYS: i64 = 7;

/// Minimum paired points for a window's correlation to count.
const WINDOW_MIN_POINTS: usize = 10;

/// Classify whether a relationship is strengthening, stable, or weakening.
///
/// Recomputes the correlation in rolling windows across the lookback and
/// compares the earliest and latest usable windows' |r|. The shift threshold
/// is a documented tunable (default 0.10 absolute); with fewer than two
/// usable windows the relationship is reported stable.
pub fn classify_trend(aligned: &AlignedPair, cfg: &InsightConfig) -> TrendResult {
    let window = Duration::days(i64::from(cfg.rolling_window_days));
    let stable = TrendResult {
        direction: TrendDirection::Stable,
        window_days: cfg.rolling_window_days,
    };
    let (Some(first_date), Some(last_date)) = (aligned.dates.first(), aligned.dates.last()) else {
        return stable;
    };

    let mut window_effects: Vec<f64> = Vec::new();
    let mut start = *first_date;
    while start <= *last_date {
        let end = start + window;
        let mut xs: Vec<f64> = Vec::new();
        let mut ys: Vec<f64> = Vec::new();
        for (idx, date) in aligned.dates.iter().enumerate() {
            if *date >= start && *date < end {
                xs.push(aligned.a[idx]);
                ys.push(aligned.b[idx]);
            }
        }
        if xs.len() >= WINDOW_MIN_POINTS {
            let r = match cfg.correlation {
                CorrelationKind::Rank => spearman(&xs, &ys),
                CorrelationKind::Linear => pearson(&xs, &ys),
            };
            if let Some(r) = r {
                window_effects.push(r.abs());
            }
        }
        start += Duration::days(WINDOW_STEP_DAYS);
    }

    let (Some(first), Some(last)) = (window_effects.first(), window_effects.last()) else {
        return stable;
    };
    if window_effects.len() < 2 {
        return stable;
    }
    let shift = last - first;
    let direction = if shift > cfg.trend_shift_threshold {
        TrendDirection::Strengthening
    } else if shift < -cfg.trend_shift_threshold {
        TrendDirection::Weakening
    } else {
        TrendDirection::Stable
    };
    TrendResult {
        direction,
        window_days: cfg.rolling_window_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::align;
    use crate::test_support::{continuous_series, dates_from};
    use crate::types::Domain;

    fn cfg() -> InsightConfig {
        InsightConfig::default()
    }

    #[test]
    fn consistent_relationship_reads_stable() {
        let days = dates_from("2026-01-01", 90);
        let a = continuous_series(Domain::Health, "sleep_hours", &days, |i| {
            ((i * 7) % 11) as f64
        });
        let b = continuous_series(Domain::Mood, "mood_score", &days, |i| {
            ((i * 7) % 11) as f64 * 0.9 + ((i * 3) % 2) as f64 * 0.2
        });
        let trend = classify_trend(&align(&a, &b), &cfg());
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.window_days, 30);
    }

    #[test]
    fn relationship_that_decays_reads_weakening() {
        let days = dates_from("2026-01-01", 90);
        let a = continuous_series(Domain::Health, "sleep_hours", &days, |i| {
            ((i * 7) % 11) as f64
        });
        // Tracks a early on, then degenerates into an unrelated pattern.
        let b = continuous_series(Domain::Mood, "mood_score", &days, |i| {
            if i < 45 {
                ((i * 7) % 11) as f64
            } else {
                ((i * 5) % 13) as f64
            }
        });
        let trend = classify_trend(&align(&a, &b), &cfg());
        assert_eq!(trend.direction, TrendDirection::Weakening);
    }

    #[test]
    fn relationship_that_emerges_reads_strengthening() {
        let days = dates_from("2026-01-01", 90);
        let a = continuous_series(Domain::Health, "sleep_hours", &days, |i| {
            ((i * 7) % 11) as f64
        });
        let b = continuous_series(Domain::Mood, "mood_score", &days, |i| {
            if i < 45 {
                ((i * 5) % 13) as f64
            } else {
                ((i * 7) % 11) as f64
            }
        });
        let trend = classify_trend(&align(&a, &b), &cfg());
        assert_eq!(trend.direction, TrendDirection::Strengthening);
    }

    #[test]
    fn short_history_defaults_to_stable() {
        let days = dates_from("2026-01-01", 20);
        let a = continuous_series(Domain::Health, "sleep_hours", &days, |i| i as f64);
        let b = continuous_series(Domain::Mood, "mood_score", &days, |i| (i * 2) as f64);
        let trend = classify_trend(&align(&a, &b), &cfg());
        assert_eq!(trend.direction, TrendDirection::Stable);
    }
}
