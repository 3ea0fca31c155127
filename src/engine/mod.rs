//! The insight pipeline: per-pair correlation with autocorrelation-aware
//! significance, a batch FDR barrier, per-survivor enrichment, ranking, and
//! handoff to explanation and persistence.

pub mod confounder;
pub mod lag;
pub mod pair_stats;
pub mod pairs;
pub mod pipeline;
pub mod ranker;
pub mod significance;
pub mod trend;
pub mod with_without;

pub use pipeline::{InsightEngine, RunSummary};
