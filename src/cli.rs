use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "insight-engine-rs",
    version,
    about = "Batch correlation insight engine for daily life metrics"
)]
pub struct Args {
    /// Input JSON document: user id plus per-metric daily series.
    #[arg(long)]
    pub input: PathBuf,

    /// Where the persisted connections document is written.
    #[arg(long, default_value = "connections.json")]
    pub output: PathBuf,

    /// Print the run summary as JSON on stdout.
    #[arg(long, default_value_t = false)]
    pub summary_json: bool,
}
