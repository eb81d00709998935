//! Per-model metric aggregation and summary persistence

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::map_persist_err;
use crate::trial_log::LoggedTrials;

/// Running sums over one model's trials.
///
/// Owned by a single model's run and discarded once its summary is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Sum of 0-100 match percents
    pub match_percent: u64,
    /// Sum of per-trial elapsed times
    pub elapsed_ms: u64,
    pub trials: usize,
}

impl RunningTotals {
    pub fn record(&mut self, input_tokens: u64, output_tokens: u64, match_percent: u32, elapsed_ms: u64) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.match_percent += u64::from(match_percent);
        self.elapsed_ms += elapsed_ms;
        self.trials += 1;
    }

    /// Rebuild totals from a log read back from disk
    pub fn from_log(logged: &LoggedTrials) -> Self {
        logged
            .rows
            .iter()
            .zip(logged.per_trial_elapsed_ms())
            .fold(Self::default(), |mut totals, (row, elapsed)| {
                totals.record(row.input_tokens, row.output_tokens, row.match_percent, elapsed);
                totals
            })
    }
}

/// Per-model averages over every trial of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_name: String,
    pub avg_input_tokens: f64,
    pub avg_output_tokens: f64,
    /// Mean match percent as a 0-1 fraction
    pub avg_tools_called_fraction: f64,
    pub avg_time_ms: f64,
}

/// Compute the means; with no trials every mean is `0.0`
pub fn summarize(model_name: &str, totals: &RunningTotals) -> ModelSummary {
    let mean = |sum: u64| {
        if totals.trials == 0 {
            0.0
        } else {
            sum as f64 / totals.trials as f64
        }
    };

    ModelSummary {
        model_name: model_name.to_string(),
        avg_input_tokens: mean(totals.input_tokens),
        avg_output_tokens: mean(totals.output_tokens),
        avg_tools_called_fraction: mean(totals.match_percent) / 100.0,
        avg_time_ms: mean(totals.elapsed_ms),
    }
}

/// Write a summary, replacing whatever was at `path`
pub fn write_summary(path: &Path, summary: &ModelSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(map_persist_err!(parent))?;
    }
    let mut json = serde_json::to_string_pretty(summary)?;
    json.push('\n');
    fs::write(path, json).map_err(map_persist_err!(path))
}

pub fn read_summary(path: &Path) -> Result<ModelSummary> {
    if !path.exists() {
        return Err(BenchError::not_found("summary", path.display()));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| BenchError::Other(format!("failed to read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElapsedMode;
    use crate::trial_log::TrialRow;
    use tempfile::tempdir;

    #[test]
    fn test_two_trial_means() {
        let mut totals = RunningTotals::default();
        totals.record(10, 5, 100, 100);
        totals.record(30, 15, 0, 300);

        let summary = summarize("m", &totals);
        assert_eq!(summary.avg_input_tokens, 20.0);
        assert_eq!(summary.avg_output_tokens, 10.0);
        assert_eq!(summary.avg_tools_called_fraction, 0.5);
        assert_eq!(summary.avg_time_ms, 200.0);
    }

    #[test]
    fn test_zero_trials_yield_zero_means() {
        let summary = summarize("empty", &RunningTotals::default());
        assert_eq!(summary.model_name, "empty");
        assert_eq!(summary.avg_input_tokens, 0.0);
        assert_eq!(summary.avg_output_tokens, 0.0);
        assert_eq!(summary.avg_tools_called_fraction, 0.0);
        assert_eq!(summary.avg_time_ms, 0.0);
    }

    #[test]
    fn test_totals_from_cumulative_log() {
        let row = |elapsed_ms, match_percent, input_tokens| TrialRow {
            trial_key: "k".into(),
            input_tokens,
            output_tokens: 1,
            elapsed_ms,
            match_percent,
            matched: Vec::new(),
            unmatched: Vec::new(),
            diagnostic: String::new(),
        };
        let logged = LoggedTrials {
            mode: ElapsedMode::Cumulative,
            rows: vec![row(100, 100, 10), row(400, 0, 30)],
        };

        let totals = RunningTotals::from_log(&logged);
        assert_eq!(totals.trials, 2);
        assert_eq!(totals.elapsed_ms, 400);
        assert_eq!(summarize("m", &totals).avg_time_ms, 200.0);
    }

    #[test]
    fn test_write_replaces_existing_summary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{\"stale\": true, \"padding\": \"xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx\"}").unwrap();

        let summary = summarize("m", &RunningTotals::default());
        write_summary(&path, &summary).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert_eq!(read_summary(&path).unwrap(), summary);
    }

    #[test]
    fn test_summary_field_names() {
        let summary = summarize("m", &RunningTotals::default());
        let json = serde_json::to_value(&summary).unwrap();
        for field in [
            "model_name",
            "avg_input_tokens",
            "avg_output_tokens",
            "avg_tools_called_fraction",
            "avg_time_ms",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_read_missing_summary_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_summary(&dir.path().join("absent_summary.json")).unwrap_err();
        assert!(matches!(err, BenchError::NotFound { .. }));
        assert_eq!(err.exit_code(), crate::error::ExitCode::Data);
    }
}
