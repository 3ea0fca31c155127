use crate::engine::pair_stats::PairStats;
use crate::engine::ranker::EnrichedPair;
use crate::explain::{ExplainError, ExplanationContext, ExplanationGateway, ExplanationText};
use crate::series::{AlignedPair, DailySeries};
use crate::store::{ConnectionStore, StoreError};
use crate::types::{
    CandidatePair, Connection, ConnectionDirection, CorrelationKind, CorrelationResult, Domain,
    ExampleDays, LagDirection, LagResult, MetricId, MetricKind, TrendDirection, TrendResult,
};
use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub fn dates_from(start: &str, count: usize) -> Vec<NaiveDate> {
    let start: NaiveDate = start.parse().expect("test start date");
    (0..count as i64)
        .map(|i| start + chrono::Duration::days(i))
        .collect()
}

pub fn continuous_series(
    domain: Domain,
    metric: &str,
    days: &[NaiveDate],
    value: impl Fn(usize) -> f64,
) -> DailySeries {
    let mut series = DailySeries::new(MetricId::new(domain, metric, MetricKind::Continuous));
    for (i, d) in days.iter().enumerate() {
        series.insert(*d, value(i));
    }
    series
}

/// Occurrence series: an entry only on the days the behavior happened.
pub fn occurrence_series(
    domain: Domain,
    metric: &str,
    days: &[NaiveDate],
    happened: impl Fn(usize) -> bool,
) -> DailySeries {
    let mut series = DailySeries::new(MetricId::new(domain, metric, MetricKind::Occurrence));
    for (i, d) in days.iter().enumerate() {
        if happened(i) {
            series.insert(*d, 1.0);
        }
    }
    series
}

pub fn enriched_pair_with_effect(metric_a: &str, effect: f64) -> EnrichedPair {
    let days = dates_from("2026-01-01", 20);
    let pair = CandidatePair {
        a: MetricId::new(Domain::Health, metric_a, MetricKind::Continuous),
        b: MetricId::new(Domain::Mood, "mood_score", MetricKind::Continuous),
        check_time_lag: false,
    };
    let aligned = AlignedPair {
        dates: days,
        a: (0..20).map(|i| i as f64).collect(),
        b: (0..20).map(|i| (i * 2) as f64).collect(),
    };
    EnrichedPair {
        stats: PairStats {
            pair,
            aligned,
            result: CorrelationResult {
                kind: CorrelationKind::Rank,
                rho: effect,
                pearson_r: effect,
                raw_p: 0.001,
                adjusted_p: 0.004,
                sample_size: 20,
                effective_sample_size: 18,
                effect_size: effect,
                significant: true,
            },
        },
        confounder: None,
        lag: LagResult {
            direction: LagDirection::SameDay,
            lag_days: 0,
            effect_size: effect,
        },
        trend: TrendResult {
            direction: TrendDirection::Stable,
            window_days: 30,
        },
        with_without: None,
        example_days: ExampleDays {
            best: None,
            worst: None,
        },
    }
}

pub fn connection_with_strength(strength: f64) -> Connection {
    let now = Utc::now();
    Connection {
        id: Uuid::new_v4(),
        category: "health_mood".to_string(),
        direction: ConnectionDirection::Positive,
        strength,
        domain_a: Domain::Health,
        domain_b: Domain::Mood,
        metric_a: "sleep_hours".to_string(),
        metric_b: "mood_score".to_string(),
        title: "test".to_string(),
        description: "test".to_string(),
        explanation: "test".to_string(),
        recommendation: "test".to_string(),
        correlation: CorrelationResult {
            kind: CorrelationKind::Rank,
            rho: strength,
            pearson_r: strength,
            raw_p: 0.001,
            adjusted_p: 0.004,
            sample_size: 30,
            effective_sample_size: 24,
            effect_size: strength,
            significant: true,
        },
        time_lag: None,
        with_without: None,
        survives_confounder_control: true,
        confounder_partial_r: strength,
        confounder_note: None,
        trend_direction: TrendDirection::Stable,
        data_points: 30,
        detected_at: now,
        expires_at: now + chrono::Duration::days(30),
        dismissed: false,
        ai_generated: false,
    }
}

/// Gateway that always succeeds with fixed text.
#[derive(Debug, Clone, Copy)]
pub struct StubGateway;

impl ExplanationGateway for StubGateway {
    async fn explain(&self, ctx: &ExplanationContext) -> Result<ExplanationText, ExplainError> {
        Ok(ExplanationText {
            title: format!("{} and {}", ctx.metric_a, ctx.metric_b),
            explanation: "stub explanation".to_string(),
            recommendation: "stub recommendation".to_string(),
        })
    }
}

/// Store that fails transiently a fixed number of times, then succeeds.
#[derive(Debug)]
pub struct FailsThenSucceedsStore {
    remaining_failures: AtomicU32,
    persisted: Mutex<Vec<Connection>>,
}

impl FailsThenSucceedsStore {
    pub fn new(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
            persisted: Mutex::new(Vec::new()),
        }
    }

    pub fn persisted(&self) -> usize {
        self.persisted.lock().expect("store lock").len()
    }
}

impl ConnectionStore for FailsThenSucceedsStore {
    async fn persist(&self, _user_id: &str, connections: &[Connection]) -> Result<(), StoreError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Transient("simulated outage".to_string()));
        }
        self.persisted
            .lock()
            .map_err(|e| StoreError::Permanent(e.to_string()))?
            .extend_from_slice(connections);
        Ok(())
    }
}
