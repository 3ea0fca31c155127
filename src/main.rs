use anyhow::{Context, Result};
use clap::Parser;
use insight_engine_rs::{cli, config, engine, explain, series, store};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
struct InputDocument {
    user_id: String,
    series: Vec<series::DailySeries>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let cfg = config::InsightConfig::from_env();

    let body = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input {}", args.input.display()))?;
    let input: InputDocument = serde_json::from_str(&body)
        .with_context(|| format!("failed to parse input {}", args.input.display()))?;

    let engine = engine::InsightEngine::new(
        cfg,
        explain::NullGateway,
        store::JsonFileStore::new(args.output.clone()),
    );
    let summary = engine
        .run(&input.user_id, input.series, CancellationToken::new())
        .await
        .context("insight run failed")?;

    if args.summary_json {
        println!(
            "{}",
            serde_json::json!({
                "pairs_total": summary.pairs_total,
                "pairs_skipped": summary.pairs_skipped,
                "pairs_tested": summary.pairs_tested,
                "survivors": summary.survivors,
                "connections": summary.connections,
                "timings_ms": summary.timings_ms,
            })
        );
    } else {
        tracing::info!(
            pairs_total = summary.pairs_total,
            survivors = summary.survivors,
            connections = summary.connections,
            output = %args.output.display(),
            "connections written"
        );
    }

    Ok(())
}
