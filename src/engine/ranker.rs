use crate::config::InsightConfig;
use crate::engine::pair_stats::PairStats;
use crate::explain::ExplanationText;
use crate::types::{
    ConfounderAdjustment, Connection, ConnectionDirection, ExampleDays, LagDirection, LagResult,
    TrendResult, WithWithoutResult,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// A significant pair after Stage C enrichment, ready for ranking and
/// explanation.
#[derive(Debug, Clone)]
pub struct EnrichedPair {
    pub stats: PairStats,
    pub confounder: Option<ConfounderAdjustment>,
    pub lag: LagResult,
    pub trend: TrendResult,
    pub with_without: Option<WithWithoutResult>,
    pub example_days: ExampleDays,
}

impl EnrichedPair {
    /// Effect size used for ranking and explanation: the lagged result when
    /// it replaced the same-day finding, otherwise the same-day coefficient.
    pub fn effect(&self) -> f64 {
        self.lag.effect_size
    }
}

/// Order survivors by descending absolute effect size and keep the top N.
pub fn rank_top_n(mut enriched: Vec<EnrichedPair>, top_n: usize) -> Vec<EnrichedPair> {
    enriched.sort_by(|a, b| b.effect().abs().total_cmp(&a.effect().abs()));
    enriched.truncate(top_n);
    enriched
}

/// Map one enriched pair into the durable connection record.
pub fn to_connection(
    enriched: &EnrichedPair,
    text: ExplanationText,
    ai_generated: bool,
    detected_at: DateTime<Utc>,
    cfg: &InsightConfig,
) -> Connection {
    let pair = &enriched.stats.pair;
    let effect = enriched.effect();
    let direction = if effect >= 0.0 {
        ConnectionDirection::Positive
    } else {
        ConnectionDirection::Negative
    };
    let (confounder_partial_r, survives, confounder_note) = match &enriched.confounder {
        Some(adj) if adj.survives_confounder_control => (adj.partial_coefficient, true, None),
        Some(adj) => (
            adj.partial_coefficient,
            false,
            Some(format!(
                "Weaker evidence: much of this relationship is explained by {}.",
                adj.confounder
            )),
        ),
        None => (enriched.stats.result.rho, true, None),
    };

    Connection {
        id: Uuid::new_v4(),
        category: format!("{}_{}", pair.a.domain.as_str(), pair.b.domain.as_str()),
        direction,
        strength: effect.abs(),
        domain_a: pair.a.domain,
        domain_b: pair.b.domain,
        metric_a: pair.a.metric.clone(),
        metric_b: pair.b.metric.clone(),
        title: text.title,
        description: text.explanation.clone(),
        explanation: text.explanation,
        recommendation: text.recommendation,
        correlation: enriched.stats.result.clone(),
        time_lag: match enriched.lag.direction {
            LagDirection::SameDay => None,
            _ => Some(enriched.lag),
        },
        with_without: enriched.with_without,
        survives_confounder_control: survives,
        confounder_partial_r,
        confounder_note,
        trend_direction: enriched.trend.direction,
        data_points: enriched.stats.result.sample_size,
        detected_at,
        expires_at: detected_at + Duration::days(i64::from(cfg.connection_ttl_days)),
        dismissed: false,
        ai_generated,
    }
}
