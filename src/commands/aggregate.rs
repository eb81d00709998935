//! `toolbench aggregate` - average summaries across repeated runs

use serde_json::json;

use crate::cli::{AggregateArgs, OutputFormat};
use crate::commands::dispatch::CommandContext;
use toolbench_core::aggregate;
use toolbench_core::error::{BenchError, Result};

pub fn execute(ctx: &CommandContext, args: &AggregateArgs) -> Result<()> {
    let data_dir = args.data_dir.as_ref().unwrap_or(&ctx.config.data_dir);
    let summary_dir = args.summary_dir.as_ref().unwrap_or(&ctx.config.summary_dir);

    let outcomes = aggregate::aggregate_directory(data_dir, summary_dir)?;

    match ctx.cli.format {
        OutputFormat::Json => {
            let report: Vec<_> = outcomes
                .iter()
                .map(|o| {
                    json!({
                        "prefix": o.prefix,
                        "output": o.output.display().to_string(),
                        "summary": o.aggregated,
                        "warnings": o.warnings,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(BenchError::from)?
            );
        }
        OutputFormat::Human => {
            if outcomes.is_empty() {
                ctx.say(format!(
                    "No matching summary files found in {}",
                    data_dir.display()
                ));
            }
            for outcome in &outcomes {
                ctx.say(format!(
                    "Wrote {} ({} files averaged)",
                    outcome.output.display(),
                    outcome.aggregated.number_of_runs
                ));
                for warning in &outcome.warnings {
                    ctx.say(format!("  warning: {}", warning));
                }
            }
        }
    }
    Ok(())
}
