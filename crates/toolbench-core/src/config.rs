//! Harness configuration for toolbench
//!
//! Looked up in order: an explicit path, `./toolbench.toml`, then the global
//! file `<config dir>/toolbench/config.toml`. Missing files fall back to the
//! built-in defaults.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};
use crate::paths::safe_name;

pub use types::{
    ElapsedMode, HarnessConfig, ModelConfig, Provider, DEFAULT_DATA_DIR, DEFAULT_SUMMARY_DIR,
};

/// Project-local configuration file name
pub const LOCAL_CONFIG_FILE: &str = "toolbench.toml";

const CONFIG_DIR: &str = "toolbench";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV_VAR: &str = "TOOLBENCH_CONFIG_DIR";

impl HarnessConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BenchError::Other(format!(
                "failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: HarnessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for this process
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(BenchError::not_found("config file", path.display()));
            }
            return Self::load(path);
        }

        let local = cwd.join(LOCAL_CONFIG_FILE);
        if local.exists() {
            tracing::debug!(path = %local.display(), "using project config");
            return Self::load(&local);
        }

        if let Some(global) = Self::global_path() {
            if global.exists() {
                tracing::debug!(path = %global.display(), "using global config");
                return Self::load(&global);
            }
        }

        Ok(Self::default())
    }

    fn global_path() -> Option<PathBuf> {
        // Allow environment variable override for testing
        let config_dir = match std::env::var(CONFIG_DIR_ENV_VAR) {
            Ok(env_dir) => PathBuf::from(env_dir),
            Err(_) => dirs::config_dir()?.join(CONFIG_DIR),
        };
        Some(config_dir.join(CONFIG_FILE))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BenchError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            crate::bail_invalid!("jobs", "0 (must be at least 1)");
        }

        // Output files are keyed by the filesystem-safe form of the name
        let mut seen: std::collections::HashMap<String, &str> = std::collections::HashMap::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                crate::bail_invalid!("model name", "empty string");
            }
            if let Some(previous) = seen.insert(safe_name(&model.name), &model.name) {
                if previous == model.name {
                    crate::bail_invalid!("model name", format!("{} (duplicate)", model.name));
                }
                crate::bail_invalid!(
                    "model name",
                    format!("{} (writes the same files as {})", model.name, previous)
                );
            }
            if model.max_tool_rounds == Some(0) {
                crate::bail_invalid!(
                    "max_tool_rounds",
                    format!("0 for model {} (must be at least 1)", model.name)
                );
            }
        }
        Ok(())
    }
}
