//! Command argument structures

use std::path::PathBuf;

use clap::Args;

use toolbench_core::config::ElapsedMode;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Catalog file (.json, .yaml or .yml)
    pub catalog: PathBuf,

    /// Only run these models (repeatable; default: all registered models)
    #[arg(long, short)]
    pub model: Vec<String>,

    /// Directory for logs and summaries
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Meaning of the log's elapsed column (cumulative, per_trial)
    #[arg(long)]
    pub elapsed: Option<ElapsedMode>,

    /// Maximum number of models run concurrently
    #[arg(long, short, value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: Option<u64>,

    /// Catalog identifier used in output file names
    #[arg(long)]
    pub id: Option<String>,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Catalog file (.json, .yaml or .yml)
    pub catalog: PathBuf,
}

/// Arguments for the summarize command.
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Trial log written by a previous run
    pub log: PathBuf,

    /// Model name recorded in the summary (default: taken from the log file name)
    #[arg(long, short)]
    pub model: Option<String>,

    /// Write the summary to this file instead of only printing it
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for the aggregate command.
#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Directory holding per-run summaries
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for averaged summaries
    #[arg(long)]
    pub summary_dir: Option<PathBuf>,
}
