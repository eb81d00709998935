//! `toolbench models` - list the model registry

use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::dispatch::CommandContext;
use toolbench_core::backend::registry::DEFAULT_LOCAL_MODELS;
use toolbench_core::config::{ModelConfig, Provider};
use toolbench_core::error::{BenchError, Result};

/// Configured models, or the local stubs registered when none are configured
fn registered(models: &[ModelConfig]) -> Vec<ModelConfig> {
    if models.is_empty() {
        DEFAULT_LOCAL_MODELS
            .iter()
            .map(|name| ModelConfig::local(name, Provider::Echo))
            .collect()
    } else {
        models.to_vec()
    }
}

fn provider_label(provider: Provider) -> &'static str {
    match provider {
        Provider::Echo => "echo",
        Provider::Mock => "mock",
        Provider::OpenAi => "openai",
    }
}

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let models = registered(&ctx.config.models);

    match ctx.cli.format {
        OutputFormat::Json => {
            let list: Vec<_> = models
                .iter()
                .map(|m| {
                    json!({
                        "name": m.name,
                        "provider": provider_label(m.provider),
                        "model": m.model,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&list).map_err(BenchError::from)?
            );
        }
        OutputFormat::Human => {
            for m in &models {
                match &m.model {
                    Some(remote) => println!("{} ({}: {})", m.name, provider_label(m.provider), remote),
                    None => println!("{} ({})", m.name, provider_label(m.provider)),
                }
            }
        }
    }
    Ok(())
}
