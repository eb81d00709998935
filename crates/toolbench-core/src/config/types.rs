//! Configuration types for toolbench

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory for logs and per-run summaries
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default directory for cross-run averaged summaries
pub const DEFAULT_SUMMARY_DIR: &str = "summary";

/// Meaning of the elapsed-time column in the trial log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElapsedMode {
    /// Running total of trial times within one model's run
    #[default]
    Cumulative,
    /// Each row carries only its own trial's time
    PerTrial,
}

impl std::str::FromStr for ElapsedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cumulative" => Ok(ElapsedMode::Cumulative),
            "per_trial" | "per-trial" => Ok(ElapsedMode::PerTrial),
            other => Err(format!(
                "unknown elapsed mode '{}' (expected: cumulative or per_trial)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local stub that never calls tools
    Echo,
    /// Local stub that calls the tools its prompt names
    Mock,
    /// OpenAI-compatible chat-completions endpoint
    #[serde(rename = "openai")]
    OpenAi,
}

/// One model under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Registry name, also used in output file names
    pub name: String,
    pub provider: Provider,
    /// Provider-side model identifier (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ModelConfig {
    pub fn local(name: &str, provider: Provider) -> Self {
        Self {
            name: name.to_string(),
            provider,
            model: None,
            base_url: None,
            api_key_env: None,
            timeout_secs: None,
            max_tool_rounds: None,
            temperature: None,
        }
    }
}

/// Harness configuration (`toolbench.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub data_dir: PathBuf,
    pub summary_dir: PathBuf,
    pub elapsed: ElapsedMode,
    /// Upper bound on models run concurrently
    pub jobs: usize,
    pub models: Vec<ModelConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            summary_dir: PathBuf::from(DEFAULT_SUMMARY_DIR),
            elapsed: ElapsedMode::default(),
            jobs: 1,
            models: Vec::new(),
        }
    }
}
