//! `toolbench run` - benchmark every selected model against a catalog

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;

use crate::cli::{OutputFormat, RunArgs};
use crate::commands::dispatch::CommandContext;
use toolbench_core::backend::ModelRegistry;
use toolbench_core::catalog;
use toolbench_core::config::HarnessConfig;
use toolbench_core::error::{BenchError, Result};
use toolbench_core::runner::{ModelOutcome, RunOptions, Runner, TrialRecord};

pub fn execute(ctx: &CommandContext, args: &RunArgs) -> Result<()> {
    let config = apply_overrides(&ctx.config, args);

    let mut catalog = catalog::load(&args.catalog)?;
    if let Some(id) = &args.id {
        catalog = catalog.with_id(id.as_str());
    }

    let registry = ModelRegistry::from_config(&config.models)?.select(&args.model)?;
    tracing::info!(
        models = registry.len(),
        jobs = config.jobs,
        identity = %catalog.identity(),
        "run_start"
    );

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);
    let _ = ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::SeqCst);
    });

    let show_trials = ctx.cli.format == OutputFormat::Human && !ctx.cli.quiet;
    let observer = move |model: &str, trial: &TrialRecord| {
        if show_trials {
            println!("{}", trial_line(model, trial));
        }
    };

    let runner = Runner::new(&catalog, RunOptions::from(&config))
        .with_interrupt(interrupted)
        .with_observer(&observer);
    let outcomes = runner.run(&registry);

    match ctx.cli.format {
        OutputFormat::Json => {
            let report: Vec<_> = outcomes.iter().map(outcome_json).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(BenchError::from)?
            );
        }
        OutputFormat::Human => {
            for outcome in &outcomes {
                print_outcome(ctx, outcome);
            }
        }
    }

    overall_result(&outcomes)
}

fn apply_overrides(config: &HarnessConfig, args: &RunArgs) -> HarnessConfig {
    let mut config = config.clone();
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(mode) = args.elapsed {
        config.elapsed = mode;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs as usize;
    }
    config
}

fn trial_line(model: &str, trial: &TrialRecord) -> String {
    let mut line = format!(
        "[{}] {}: {}% (in {}, out {}, {} ms)",
        model,
        trial.trial_key,
        trial.report.match_percent,
        trial.usage.input,
        trial.usage.output,
        trial.elapsed_ms
    );
    if trial.failed {
        line.push_str(" backend error");
    }
    line
}

fn print_outcome(ctx: &CommandContext, outcome: &ModelOutcome) {
    match &outcome.result {
        Ok(summary) => {
            ctx.say(format!("\n--- {} ---", outcome.model));
            ctx.say(format!("Log: {}", outcome.paths.log.display()));
            ctx.say(format!("Summary: {}", outcome.paths.summary.display()));
            ctx.say(format!("Avg input tokens: {:.2}", summary.avg_input_tokens));
            ctx.say(format!("Avg output tokens: {:.2}", summary.avg_output_tokens));
            ctx.say(format!(
                "Avg tools called: {:.1}%",
                summary.avg_tools_called_fraction * 100.0
            ));
            ctx.say(format!("Avg time: {:.1} ms", summary.avg_time_ms));
        }
        // Failures are reported even under --quiet
        Err(e) => eprintln!("{}: {}", outcome.model, e),
    }
}

fn outcome_json(outcome: &ModelOutcome) -> serde_json::Value {
    let mut value = json!({
        "model": outcome.model,
        "log": outcome.paths.log.display().to_string(),
        "summary_path": outcome.paths.summary.display().to_string(),
    });
    match &outcome.result {
        Ok(summary) => {
            value["status"] = json!("ok");
            value["summary"] = json!(summary);
        }
        Err(e) => {
            value["status"] = json!(e.error_type());
            value["error"] = json!(e.to_string());
        }
    }
    value
}

/// Interruption wins over other failures; any failed model fails the run
fn overall_result(outcomes: &[ModelOutcome]) -> Result<()> {
    if outcomes
        .iter()
        .any(|o| matches!(o.result, Err(BenchError::Interrupted)))
    {
        return Err(BenchError::Interrupted);
    }

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.result.is_err())
        .map(|o| o.model.as_str())
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(BenchError::Other(format!(
            "{} of {} models failed: {}",
            failed.len(),
            outcomes.len(),
            failed.join(", ")
        )))
    }
}
