//! Toolbench - tool-calling benchmark harness
//!
//! Drives chat-model backends through a catalog of prompts, records which
//! requested tools were actually invoked, and summarizes token cost,
//! latency and match rate per model.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;

use cli::{Cli, OutputFormat};
use toolbench_core::error::{BenchError, ExitCode as BenchExitCode};
use toolbench_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err),
    };

    // Logging failure is not fatal; the run still produces its files
    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    match commands::dispatch::run(&cli, start) {
        Ok(()) => exit_with(BenchExitCode::Success),
        Err(e) => {
            if cli.format == OutputFormat::Json {
                eprintln!("{}", e.to_json());
            } else if !cli.quiet {
                eprintln!("error: {}", e);
            }
            exit_with(e.exit_code())
        }
    }
}

fn exit_with(code: BenchExitCode) -> ExitCode {
    ExitCode::from(code as u8)
}

/// Report a clap failure, as a JSON envelope when `--format json` was asked for.
///
/// `Cli.format` does not exist yet at this point, so the raw arguments are
/// inspected instead.
fn parse_failure(err: clap::Error) -> ExitCode {
    if !argv_requests_json() {
        err.exit();
    }

    let bench_error = match err.kind() {
        // Help and version go to stdout as usual
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        ErrorKind::ValueValidation
        | ErrorKind::InvalidValue
        | ErrorKind::InvalidSubcommand
        | ErrorKind::UnknownArgument
        | ErrorKind::ArgumentConflict
        | ErrorKind::MissingRequiredArgument
        | ErrorKind::MissingSubcommand => BenchError::UsageError(err.to_string()),
        _ => BenchError::Other(err.to_string()),
    };

    eprintln!("{}", bench_error.to_json());
    exit_with(bench_error.exit_code())
}

/// Accepts both `--format json` and `--format=json`
fn argv_requests_json() -> bool {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format=json" => return true,
            "--format" if args.next().as_deref() == Some("json") => return true,
            _ => {}
        }
    }
    false
}
