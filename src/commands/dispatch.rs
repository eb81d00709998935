//! Command dispatch logic for toolbench

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::commands;
use toolbench_core::config::HarnessConfig;
use toolbench_core::error::Result;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: HarnessConfig,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, config: HarnessConfig, start: Instant) -> Self {
        Self { cli, config, start }
    }

    /// Print a human-readable line unless `--quiet` was given
    pub fn say(&self, line: impl AsRef<str>) {
        if !self.cli.quiet {
            println!("{}", line.as_ref());
        }
    }
}

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = HarnessConfig::resolve(cli.config.as_deref(), &cwd)?;

    debug!(elapsed = ?start.elapsed(), "resolve_config");

    let ctx = CommandContext::new(cli, config, start);

    let result = match &cli.command {
        Commands::Run(args) => commands::run::execute(&ctx, args),
        Commands::Validate(args) => commands::validate::execute(&ctx, args),
        Commands::Models => commands::models::execute(&ctx),
        Commands::Summarize(args) => commands::summarize::execute(&ctx, args),
        Commands::Aggregate(args) => commands::aggregate::execute(&ctx, args),
    };

    debug!(elapsed = ?ctx.start.elapsed(), "execute_command");
    result
}
