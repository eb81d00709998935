//! CLI argument parsing for toolbench
//!
//! Global flags: --config, --format, --quiet, --verbose, --log-level, --log-json

pub mod args;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{AggregateArgs, RunArgs, SummarizeArgs, ValidateArgs};
pub use output::OutputFormat;

/// Toolbench - measure how reliably language models invoke requested tools
#[derive(Parser, Debug)]
#[command(name = "toolbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ./toolbench.toml, then the global config)
    #[arg(long, global = true, env = "TOOLBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every selected model against a tool catalog
    Run(RunArgs),

    /// Load a catalog and report its metadata without running anything
    Validate(ValidateArgs),

    /// List the models in the registry
    Models,

    /// Recompute a model summary from a trial log
    Summarize(SummarizeArgs),

    /// Average summaries of repeated runs
    Aggregate(AggregateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "toolbench",
            "--format",
            "json",
            "run",
            "catalog.json",
            "--model",
            "a",
            "--model",
            "b",
            "--elapsed",
            "per_trial",
            "--jobs",
            "2",
            "--id",
            "run7",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.catalog, PathBuf::from("catalog.json"));
                assert_eq!(args.model, vec!["a", "b"]);
                assert_eq!(args.jobs, Some(2));
                assert_eq!(args.id.as_deref(), Some("run7"));
                assert!(args.elapsed.is_some());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_jobs_must_be_positive() {
        let result = Cli::try_parse_from(["toolbench", "run", "c.json", "--jobs", "0"]);
        assert!(result.is_err());
    }
}
