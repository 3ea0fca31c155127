use crate::types::CorrelationKind;
use serde::{Deserialize, Serialize};

/// Explicit pipeline configuration, passed by value into the engine.
///
/// There is no global settings object: the engine takes this struct as a
/// parameter so runs are reproducible and parallel-safe. Environment
/// overrides exist for operators (`INSIGHT_*`); all values are clamped to
/// sane ranges on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    pub lookback_days: u32,
    pub min_sample_size: usize,
    pub min_p_value: f64,
    pub min_effect_size: f64,
    pub max_time_lag_days: u32,
    pub rolling_window_days: u32,
    /// Absolute shift in windowed |r| that counts as strengthening/weakening.
    pub trend_shift_threshold: f64,
    pub fdr_level: f64,
    pub correlation: CorrelationKind,
    pub top_n: usize,
    pub explain_timeout_seconds: u64,
    pub persist_max_attempts: u32,
    pub persist_backoff_ms: u64,
    /// Retention horizon for persisted connections.
    pub connection_ttl_days: u32,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            min_sample_size: 14,
            min_p_value: 0.05,
            min_effect_size: 0.3,
            max_time_lag_days: 3,
            rolling_window_days: 30,
            trend_shift_threshold: 0.10,
            fdr_level: 0.05,
            correlation: CorrelationKind::Rank,
            top_n: 10,
            explain_timeout_seconds: 20,
            persist_max_attempts: 3,
            persist_backoff_ms: 250,
            connection_ttl_days: 30,
        }
    }
}

impl InsightConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let correlation = match std::env::var("INSIGHT_CORRELATION").ok().as_deref() {
            Some("linear") => CorrelationKind::Linear,
            Some("rank") => CorrelationKind::Rank,
            _ => defaults.correlation,
        };
        Self {
            lookback_days: env_u32("INSIGHT_LOOKBACK_DAYS", defaults.lookback_days)
                .clamp(14, 3_650),
            min_sample_size: env_usize("INSIGHT_MIN_SAMPLE_SIZE", defaults.min_sample_size)
                .clamp(5, 10_000),
            min_p_value: env_f64("INSIGHT_MIN_P_VALUE", defaults.min_p_value)
                .clamp(0.000_1, 0.5),
            min_effect_size: env_f64("INSIGHT_MIN_EFFECT_SIZE", defaults.min_effect_size)
                .clamp(0.0, 1.0),
            max_time_lag_days: env_u32("INSIGHT_MAX_TIME_LAG_DAYS", defaults.max_time_lag_days)
                .clamp(0, 14),
            rolling_window_days: env_u32(
                "INSIGHT_ROLLING_WINDOW_DAYS",
                defaults.rolling_window_days,
            )
            .clamp(7, 365),
            trend_shift_threshold: env_f64(
                "INSIGHT_TREND_SHIFT_THRESHOLD",
                defaults.trend_shift_threshold,
            )
            .clamp(0.01, 1.0),
            fdr_level: env_f64("INSIGHT_FDR_LEVEL", defaults.fdr_level).clamp(0.000_1, 0.5),
            correlation,
            top_n: env_usize("INSIGHT_TOP_N", defaults.top_n).clamp(1, 100),
            explain_timeout_seconds: env_u64(
                "INSIGHT_EXPLAIN_TIMEOUT_SECONDS",
                defaults.explain_timeout_seconds,
            )
            .clamp(1, 300),
            persist_max_attempts: env_u32(
                "INSIGHT_PERSIST_MAX_ATTEMPTS",
                defaults.persist_max_attempts,
            )
            .clamp(1, 10),
            persist_backoff_ms: env_u64("INSIGHT_PERSIST_BACKOFF_MS", defaults.persist_backoff_ms)
                .clamp(10, 60_000),
            connection_ttl_days: env_u32(
                "INSIGHT_CONNECTION_TTL_DAYS",
                defaults.connection_ttl_days,
            )
            .clamp(1, 365),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
