//! `toolbench summarize` - rebuild a model summary from its trial log

use std::path::Path;

use crate::cli::{OutputFormat, SummarizeArgs};
use crate::commands::dispatch::CommandContext;
use toolbench_core::error::{BenchError, Result};
use toolbench_core::summary::{self, RunningTotals};
use toolbench_core::trial_log;

pub fn execute(ctx: &CommandContext, args: &SummarizeArgs) -> Result<()> {
    let logged = trial_log::read_log(&args.log)?;
    let model = match &args.model {
        Some(name) => name.clone(),
        None => model_from_log_name(&args.log),
    };

    let totals = RunningTotals::from_log(&logged);
    let summary = summary::summarize(&model, &totals);

    if let Some(output) = &args.output {
        summary::write_summary(output, &summary)?;
        tracing::info!(path = %output.display(), "summary written");
    }

    match ctx.cli.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&summary).map_err(BenchError::from)?
        ),
        OutputFormat::Human => {
            ctx.say(format!("Model: {}", summary.model_name));
            ctx.say(format!("Trials: {}", totals.trials));
            ctx.say(format!("Avg input tokens: {:.2}", summary.avg_input_tokens));
            ctx.say(format!("Avg output tokens: {:.2}", summary.avg_output_tokens));
            ctx.say(format!(
                "Avg tools called: {:.1}%",
                summary.avg_tools_called_fraction * 100.0
            ));
            ctx.say(format!("Avg time: {:.1} ms", summary.avg_time_ms));
        }
    }
    Ok(())
}

/// Recover the model name from `model_<name>_size<..>.csv`
fn model_from_log_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = stem.strip_prefix("model_").unwrap_or(stem);
    match name.rfind("_size") {
        Some(end) if end > 0 => name[..end].to_string(),
        _ => name.to_string(),
    }
}
