use crate::types::{
    ConnectionDirection, CorrelationKind, ExampleDays, LagDirection, LagResult, TrendDirection,
    WithWithoutResult,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Structured statistical context handed to the text generator.
///
/// Everything the generator may want to talk about is precomputed here; the
/// gateway never sees raw series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationContext {
    pub metric_a: String,
    pub metric_b: String,
    pub domain_a: String,
    pub domain_b: String,
    pub direction: ConnectionDirection,
    pub effect_size: f64,
    pub effective_sample_size: usize,
    pub correlation_kind: CorrelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_without: Option<WithWithoutResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_difference: Option<f64>,
    pub survives_confounder_control: bool,
    pub trend_direction: TrendDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_lag: Option<LagResult>,
    pub example_days: ExampleDays,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationText {
    pub title: String,
    pub explanation: String,
    pub recommendation: String,
}

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("explanation generation timed out")]
    Timeout,
    #[error("explanation backend unavailable: {0}")]
    Unavailable(String),
    #[error("explanation backend returned an invalid response: {0}")]
    Invalid(String),
}

/// Abstract text-generation capability.
///
/// The engine depends only on this trait, never on a concrete vendor; a
/// failure or timeout on one call falls back to [`template_text`] for that
/// connection and must never fail the batch.
pub trait ExplanationGateway: Send + Sync {
    fn explain(
        &self,
        ctx: &ExplanationContext,
    ) -> impl Future<Output = Result<ExplanationText, ExplainError>> + Send;
}

/// Gateway that always declines, for deployments without a text backend.
/// Every connection then carries template text with `ai_generated = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGateway;

impl ExplanationGateway for NullGateway {
    async fn explain(&self, _ctx: &ExplanationContext) -> Result<ExplanationText, ExplainError> {
        Err(ExplainError::Unavailable("no gateway configured".to_string()))
    }
}

/// Deterministic fallback text built from the raw statistics.
pub fn template_text(ctx: &ExplanationContext) -> ExplanationText {
    let relation = match ctx.direction {
        ConnectionDirection::Positive => "tends to rise with",
        ConnectionDirection::Negative => "tends to fall as",
    };
    let title = format!("{} {} {}", ctx.metric_a, relation, ctx.metric_b);

    let lag_phrase = match ctx.time_lag {
        Some(LagResult {
            direction: LagDirection::ALeadsB,
            lag_days,
            ..
        }) => format!(" The effect shows up about {lag_days} day(s) later."),
        Some(LagResult {
            direction: LagDirection::BLeadsA,
            lag_days,
            ..
        }) => format!(" {} leads by about {lag_days} day(s).", ctx.metric_b),
        _ => String::new(),
    };
    let confounder_phrase = if ctx.survives_confounder_control {
        ""
    } else {
        " Part of this pattern follows your weekly routine, so read it as weaker evidence."
    };
    let percent_phrase = match ctx.percent_difference {
        Some(pct) if pct.abs() >= 1.0 => format!(
            " On days with {}, {} differs by about {:.0}%.",
            ctx.metric_a, ctx.metric_b, pct
        ),
        _ => String::new(),
    };
    let explanation = format!(
        "Across {} comparable days, {} and {} moved together ({} correlation {:+.2}, {} trend).{}{}{}",
        ctx.effective_sample_size,
        ctx.metric_a,
        ctx.metric_b,
        ctx.correlation_kind.as_str(),
        ctx.effect_size,
        ctx.trend_direction.as_str(),
        percent_phrase,
        lag_phrase,
        confounder_phrase,
    );

    let recommendation = match ctx.direction {
        ConnectionDirection::Positive => format!(
            "If you want more {}, consider making room for {}.",
            ctx.metric_b, ctx.metric_a
        ),
        ConnectionDirection::Negative => format!(
            "Keep an eye on {} on days with a lot of {}.",
            ctx.metric_b, ctx.metric_a
        ),
    };

    ExplanationText {
        title,
        explanation,
        recommendation,
    }
}
