//! `toolbench validate` - check a catalog without running any model

use serde_json::json;

use crate::cli::{OutputFormat, ValidateArgs};
use crate::commands::dispatch::CommandContext;
use toolbench_core::catalog;
use toolbench_core::error::{BenchError, Result};

pub fn execute(ctx: &CommandContext, args: &ValidateArgs) -> Result<()> {
    let catalog = catalog::load(&args.catalog)?;
    let identity = catalog.identity();
    let tools: Vec<String> = catalog
        .declared_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();

    match ctx.cli.format {
        OutputFormat::Json => {
            let entries: Vec<_> = catalog
                .entries()
                .iter()
                .map(|e| json!({ "trial_key": e.trial_key(), "tools": e.tools() }))
                .collect();
            let report = json!({
                "path": args.catalog.display().to_string(),
                "entries": catalog.len(),
                "identity": identity.to_string(),
                "digest": catalog.digest(),
                "declared_tools": tools,
                "trials": entries,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(BenchError::from)?
            );
        }
        OutputFormat::Human => {
            ctx.say(format!("Catalog: {}", args.catalog.display()));
            ctx.say(format!("Entries: {}", catalog.len()));
            ctx.say(format!("Identity: {}", identity));
            ctx.say(format!("Declared tools: {}", tools.len()));
            for entry in catalog.entries() {
                ctx.say(format!("  {} <- {}", entry.trial_key(), entry.tools().join(", ")));
            }
        }
    }
    Ok(())
}
