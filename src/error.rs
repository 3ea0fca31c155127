use thiserror::Error;

/// Reasons a single candidate pair is dropped from a run.
///
/// These are isolated per pair: they are logged and skipped, never escalated
/// to a batch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairSkip {
    #[error("aligned series too short: {actual} overlapping days, need {required}")]
    InsufficientData { actual: usize, required: usize },
    #[error("zero variance in {metric}; correlation undefined")]
    DegenerateSeries { metric: String },
}

/// Loud failures of a whole run. Everything else is isolated and recovered.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("run canceled")]
    Canceled,
    #[error("failed to persist connections after {attempts} attempts: {message}")]
    Persistence { attempts: u32, message: String },
}
