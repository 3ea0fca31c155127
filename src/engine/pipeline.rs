use crate::config::InsightConfig;
use crate::engine::confounder::control_for_day_of_week;
use crate::engine::lag::best_lag;
use crate::engine::pair_stats::{compute_pair_stats, PairStats};
use crate::engine::pairs::generate_pairs;
use crate::engine::ranker::{rank_top_n, to_connection, EnrichedPair};
use crate::engine::significance::is_significant;
use crate::engine::trend::classify_trend;
use crate::engine::with_without::compare_with_without;
use crate::error::RunError;
use crate::explain::{template_text, ExplanationContext, ExplanationGateway};
use crate::series::{AlignedPair, DailySeries};
use crate::stats::fdr::bh_adjusted_p;
use crate::store::{ConnectionStore, StoreError};
use crate::types::{Connection, ConnectionDirection, ExampleDays, LagDirection, LagResult};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// What one user's run produced, for logging and operator tooling.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pairs_total: usize,
    pub pairs_skipped: usize,
    pub pairs_tested: usize,
    pub survivors: usize,
    pub connections: usize,
    pub timings_ms: BTreeMap<String, u64>,
}

/// The batch insight pipeline for one user.
///
/// Stage A (per-pair correlation + autocorrelation adjustment) fans out
/// across blocking workers; the batch FDR correction is a hard barrier that
/// observes every raw p-value; Stage C enriches the much smaller survivor
/// set; ranking, explanation, and persistence close the run. The statistical
/// stages are pure and deterministic; only explanation and persistence touch
/// the outside world, and only persistence can fail the run.
pub struct InsightEngine<G, S> {
    cfg: InsightConfig,
    gateway: G,
    store: S,
}

struct ScoredPair {
    a_idx: usize,
    b_idx: usize,
    stats: PairStats,
}

impl<G, S> InsightEngine<G, S>
where
    G: ExplanationGateway,
    S: ConnectionStore,
{
    pub fn new(cfg: InsightConfig, gateway: G, store: S) -> Self {
        Self {
            cfg,
            gateway,
            store,
        }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.cfg
    }

    pub async fn run(
        &self,
        user_id: &str,
        series: Vec<DailySeries>,
        cancel: CancellationToken,
    ) -> Result<RunSummary, RunError> {
        let run_started = Instant::now();
        let mut timings_ms: BTreeMap<String, u64> = BTreeMap::new();

        let series = trim_to_lookback(series, self.cfg.lookback_days);
        let series = Arc::new(series);
        let pairs = generate_pairs(&series);
        let pairs_total = pairs.len();
        tracing::info!(
            phase = "start",
            user_id,
            series_count = series.len(),
            pair_count = pairs_total,
            "insight run started"
        );

        if cancel.is_cancelled() {
            return Err(RunError::Canceled);
        }

        // Stage A: embarrassingly parallel per-pair statistics.
        let stage_started = Instant::now();
        let handles: Vec<_> = pairs
            .into_iter()
            .map(|indexed| {
                let series = Arc::clone(&series);
                let cfg = self.cfg.clone();
                tokio::task::spawn_blocking(move || {
                    let stats = compute_pair_stats(
                        indexed.pair,
                        &series[indexed.a_idx],
                        &series[indexed.b_idx],
                        &cfg,
                    )?;
                    Ok::<_, crate::error::PairSkip>(ScoredPair {
                        a_idx: indexed.a_idx,
                        b_idx: indexed.b_idx,
                        stats,
                    })
                })
            })
            .collect();

        let mut scored: Vec<ScoredPair> = Vec::new();
        let mut pairs_skipped = 0usize;
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(Ok(pair)) => scored.push(pair),
                Ok(Err(skip)) => {
                    pairs_skipped += 1;
                    tracing::debug!(reason = %skip, "pair skipped");
                }
                Err(err) => {
                    pairs_skipped += 1;
                    tracing::warn!(error = %err, "pair stats task failed; pair skipped");
                }
            }
        }
        timings_ms.insert(
            "pair_stats_ms".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );
        tracing::info!(
            phase = "pair_stats",
            duration_ms = stage_started.elapsed().as_millis() as u64,
            tested = scored.len(),
            skipped = pairs_skipped,
            "per-pair statistics computed"
        );

        if cancel.is_cancelled() {
            return Err(RunError::Canceled);
        }

        // Barrier: the FDR correction needs every raw p-value of the run.
        let stage_started = Instant::now();
        let keyed_p: Vec<(usize, f64)> = scored
            .iter()
            .enumerate()
            .map(|(idx, pair)| (idx, pair.stats.result.raw_p))
            .collect();
        for (idx, adjusted) in bh_adjusted_p(&keyed_p) {
            let result = &mut scored[idx].stats.result;
            result.adjusted_p = adjusted;
            result.significant = is_significant(result, &self.cfg);
        }
        let pairs_tested = scored.len();
        let survivors: Vec<ScoredPair> = scored
            .into_iter()
            .filter(|pair| pair.stats.result.significant)
            .collect();
        timings_ms.insert(
            "fdr_ms".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );
        tracing::info!(
            phase = "fdr",
            tested = pairs_tested,
            survivors = survivors.len(),
            "multiple-comparisons correction applied"
        );

        if cancel.is_cancelled() {
            return Err(RunError::Canceled);
        }

        // Stage C: enrich the survivors, in parallel again.
        let stage_started = Instant::now();
        let enrich_handles: Vec<_> = survivors
            .into_iter()
            .map(|pair| {
                let series = Arc::clone(&series);
                let cfg = self.cfg.clone();
                tokio::task::spawn_blocking(move || enrich_pair(pair, &series, &cfg))
            })
            .collect();
        let mut enriched: Vec<EnrichedPair> = Vec::new();
        for joined in futures::future::join_all(enrich_handles).await {
            match joined {
                Ok(pair) => enriched.push(pair),
                Err(err) => {
                    tracing::warn!(error = %err, "enrichment task failed; pair dropped");
                }
            }
        }
        let survivor_count = enriched.len();
        timings_ms.insert(
            "enrich_ms".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );

        if cancel.is_cancelled() {
            return Err(RunError::Canceled);
        }

        // Rank, explain, persist.
        let ranked = rank_top_n(enriched, self.cfg.top_n);
        let detected_at = Utc::now();
        let stage_started = Instant::now();
        let connections: Vec<Connection> = futures::future::join_all(
            ranked.iter().map(|pair| self.explain_one(pair)),
        )
        .await
        .into_iter()
        .zip(ranked.iter())
        .map(|((text, ai_generated), pair)| {
            to_connection(pair, text, ai_generated, detected_at, &self.cfg)
        })
        .collect();
        timings_ms.insert(
            "explain_ms".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );

        let stage_started = Instant::now();
        if !connections.is_empty() {
            self.persist_with_retry(user_id, &connections).await?;
        }
        timings_ms.insert(
            "persist_ms".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );
        timings_ms.insert(
            "run_total_ms".to_string(),
            run_started.elapsed().as_millis() as u64,
        );

        tracing::info!(
            phase = "complete",
            duration_ms = run_started.elapsed().as_millis() as u64,
            connections = connections.len(),
            "insight run finished"
        );

        Ok(RunSummary {
            pairs_total,
            pairs_skipped,
            pairs_tested,
            survivors: survivor_count,
            connections: connections.len(),
            timings_ms,
        })
    }

    async fn explain_one(&self, pair: &EnrichedPair) -> (crate::explain::ExplanationText, bool) {
        let ctx = build_context(pair);
        let timeout = Duration::from_secs(self.cfg.explain_timeout_seconds);
        match tokio::time::timeout(timeout, self.gateway.explain(&ctx)).await {
            Ok(Ok(text)) => (text, true),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "explanation failed; using template text");
                (template_text(&ctx), false)
            }
            Err(_) => {
                tracing::warn!("explanation timed out; using template text");
                (template_text(&ctx), false)
            }
        }
    }

    async fn persist_with_retry(
        &self,
        user_id: &str,
        connections: &[Connection],
    ) -> Result<(), RunError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.store.persist(user_id, connections).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Transient(message)) if attempt < self.cfg.persist_max_attempts => {
                    tracing::warn!(
                        attempt,
                        error = %message,
                        "transient persistence failure; backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(
                        self.cfg.persist_backoff_ms * u64::from(attempt),
                    ))
                    .await;
                }
                Err(err) => {
                    return Err(RunError::Persistence {
                        attempts: attempt,
                        message: err.to_string(),
                    })
                }
            }
        }
    }
}

/// Keep only the last `lookback_days` of each series, anchored on the most
/// recent date present anywhere in the input.
fn trim_to_lookback(mut series: Vec<DailySeries>, lookback_days: u32) -> Vec<DailySeries> {
    let Some(max_date) = series
        .iter()
        .filter_map(|s| s.values.keys().next_back())
        .max()
        .copied()
    else {
        return series;
    };
    let cutoff = max_date - ChronoDuration::days(i64::from(lookback_days) - 1);
    for s in series.iter_mut() {
        s.values.retain(|date, _| *date >= cutoff);
    }
    series
}

fn enrich_pair(pair: ScoredPair, series: &[DailySeries], cfg: &InsightConfig) -> EnrichedPair {
    let a = &series[pair.a_idx];
    let b = &series[pair.b_idx];
    let stats = pair.stats;

    let confounder = control_for_day_of_week(&stats);
    let lag = if stats.pair.check_time_lag {
        best_lag(a, b, stats.result.effect_size, cfg)
    } else {
        LagResult {
            direction: LagDirection::SameDay,
            lag_days: 0,
            effect_size: stats.result.effect_size,
        }
    };
    let trend = classify_trend(&stats.aligned, cfg);
    let with_without = if stats.pair.has_occurrence_metric() {
        compare_with_without(&stats.aligned, stats.pair.a.is_occurrence())
    } else {
        None
    };
    let example_days = example_days(&stats.aligned, stats.result.effect_size);

    EnrichedPair {
        stats,
        confounder,
        lag,
        trend,
        with_without,
        example_days,
    }
}

/// Pick the days where the relationship showed most and least clearly:
/// the largest and smallest sums of (sign-adjusted) z-scores.
fn example_days(aligned: &AlignedPair, effect: f64) -> ExampleDays {
    let none = ExampleDays {
        best: None,
        worst: None,
    };
    if aligned.len() < 2 {
        return none;
    }
    let (Some(za), Some(zb)) = (z_scores(&aligned.a), z_scores(&aligned.b)) else {
        return none;
    };
    let sign = if effect >= 0.0 { 1.0 } else { -1.0 };
    let mut best: Option<(usize, f64)> = None;
    let mut worst: Option<(usize, f64)> = None;
    for i in 0..aligned.len() {
        let score = za[i] + sign * zb[i];
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((i, score));
        }
        if worst.map(|(_, s)| score < s).unwrap_or(true) {
            worst = Some((i, score));
        }
    }
    ExampleDays {
        best: best.map(|(i, _)| aligned.dates[i]),
        worst: worst.map(|(i, _)| aligned.dates[i]),
    }
}

fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    if var <= 0.0 {
        return None;
    }
    let sd = var.sqrt();
    Some(values.iter().map(|v| (v - mean) / sd).collect())
}

fn build_context(pair: &EnrichedPair) -> ExplanationContext {
    let meta = &pair.stats.pair;
    let effect = pair.effect();
    ExplanationContext {
        metric_a: meta.a.metric.clone(),
        metric_b: meta.b.metric.clone(),
        domain_a: meta.a.domain.as_str().to_string(),
        domain_b: meta.b.domain.as_str().to_string(),
        direction: if effect >= 0.0 {
            ConnectionDirection::Positive
        } else {
            ConnectionDirection::Negative
        },
        effect_size: effect,
        effective_sample_size: pair.stats.result.effective_sample_size,
        correlation_kind: pair.stats.result.kind,
        with_without: pair.with_without,
        percent_difference: pair.with_without.map(|w| w.percent_difference),
        survives_confounder_control: pair
            .confounder
            .as_ref()
            .map(|c| c.survives_confounder_control)
            .unwrap_or(true),
        trend_direction: pair.trend.direction,
        time_lag: match pair.lag.direction {
            LagDirection::SameDay => None,
            _ => Some(pair.lag),
        },
        example_days: pair.example_days,
    }
}
