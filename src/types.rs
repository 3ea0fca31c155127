use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Life-metric categories the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Health,
    Activity,
    Journal,
    Mood,
    Weather,
    Temporal,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Health => "health",
            Domain::Activity => "activity",
            Domain::Journal => "journal",
            Domain::Mood => "mood",
            Domain::Weather => "weather",
            Domain::Temporal => "temporal",
        }
    }
}

/// How a metric's daily values are interpreted.
///
/// Continuous metrics have an absent day mean "not measured"; occurrence
/// metrics (did X happen, how many times) have an absent day mean zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Continuous,
    Occurrence,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricId {
    pub domain: Domain,
    pub metric: String,
    pub kind: MetricKind,
}

impl MetricId {
    pub fn new(domain: Domain, metric: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            domain,
            metric: metric.into(),
            kind,
        }
    }

    /// Stable identifier used for pair deduplication.
    pub fn key(&self) -> String {
        format!("{}:{}", self.domain.as_str(), self.metric)
    }

    pub fn is_occurrence(&self) -> bool {
        matches!(self.kind, MetricKind::Occurrence)
    }
}

/// One candidate metric pair scheduled for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePair {
    pub a: MetricId,
    pub b: MetricId,
    pub check_time_lag: bool,
}

impl CandidatePair {
    /// Order-independent key so `A x B` and `B x A` never both run.
    pub fn pair_key(&self) -> (String, String) {
        let ka = self.a.key();
        let kb = self.b.key();
        if ka <= kb {
            (ka, kb)
        } else {
            (kb, ka)
        }
    }

    pub fn has_occurrence_metric(&self) -> bool {
        self.a.is_occurrence() || self.b.is_occurrence()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKind {
    Rank,
    Linear,
}

impl CorrelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationKind::Rank => "rank",
            CorrelationKind::Linear => "linear",
        }
    }
}

/// Per-pair statistics from the correlation stage.
///
/// Invariants: `effective_sample_size <= sample_size`, and once the batch
/// correction has run, `adjusted_p >= raw_p`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub kind: CorrelationKind,
    /// Spearman rank coefficient (primary).
    pub rho: f64,
    /// Pearson linear coefficient (secondary diagnostic).
    pub pearson_r: f64,
    pub raw_p: f64,
    pub adjusted_p: f64,
    pub sample_size: usize,
    pub effective_sample_size: usize,
    /// Signed effect size; the coefficient selected by `kind`.
    pub effect_size: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfounderAdjustment {
    pub partial_coefficient: f64,
    pub survives_confounder_control: bool,
    pub confounder: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagDirection {
    SameDay,
    ALeadsB,
    BLeadsA,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LagResult {
    pub direction: LagDirection,
    pub lag_days: u32,
    pub effect_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Strengthening,
    Stable,
    Weakening,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Strengthening => "strengthening",
            TrendDirection::Stable => "stable",
            TrendDirection::Weakening => "weakening",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub window_days: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupStats {
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WithWithoutResult {
    pub with_group: GroupStats,
    pub without_group: GroupStats,
    pub absolute_difference: f64,
    /// Percent difference relative to the without-group mean; defined as 0
    /// when that mean is itself 0.
    pub percent_difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionDirection {
    Positive,
    Negative,
}

/// The one durable record of the pipeline: a ranked, explained relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub category: String,
    pub direction: ConnectionDirection,
    /// Absolute effect size used for ranking.
    pub strength: f64,
    pub domain_a: Domain,
    pub domain_b: Domain,
    pub metric_a: String,
    pub metric_b: String,
    pub title: String,
    pub description: String,
    pub explanation: String,
    pub recommendation: String,
    pub correlation: CorrelationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_lag: Option<LagResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_without: Option<WithWithoutResult>,
    pub survives_confounder_control: bool,
    pub confounder_partial_r: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confounder_note: Option<String>,
    pub trend_direction: TrendDirection,
    pub data_points: usize,
    pub detected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub dismissed: bool,
    pub ai_generated: bool,
}

/// Example days attached to explanation context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExampleDays {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        let sleep = MetricId::new(Domain::Health, "sleep_hours", MetricKind::Continuous);
        let badminton = MetricId::new(Domain::Activity, "badminton", MetricKind::Occurrence);
        let ab = CandidatePair {
            a: sleep.clone(),
            b: badminton.clone(),
            check_time_lag: true,
        };
        let ba = CandidatePair {
            a: badminton,
            b: sleep,
            check_time_lag: true,
        };
        assert_eq!(ab.pair_key(), ba.pair_key());
        assert!(ab.has_occurrence_metric());

        let continuous_only = CandidatePair {
            a: MetricId::new(Domain::Health, "sleep_hours", MetricKind::Continuous),
            b: MetricId::new(Domain::Mood, "mood_score", MetricKind::Continuous),
            check_time_lag: true,
        };
        assert!(!continuous_only.has_occurrence_metric());
    }
}
