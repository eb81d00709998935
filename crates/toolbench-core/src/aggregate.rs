//! Cross-run averaging of model summaries
//!
//! Repeated runs of the same catalog shape differ only in their `_id<X>`
//! suffix. Summaries sharing everything before that suffix are averaged into
//! one file per prefix in the summary directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{BenchError, Result};
use crate::map_persist_err;
use crate::summary::{read_summary, ModelSummary};

fn summary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<prefix>.+)_id[^_]+_summary\.json$").expect("Invalid summary file pattern")
    })
}

/// Averaged summary written for one prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSummary {
    #[serde(flatten)]
    pub summary: ModelSummary,
    pub number_of_runs: usize,
}

/// What aggregation did for one prefix
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    pub prefix: String,
    pub output: PathBuf,
    pub aggregated: AggregatedSummary,
    pub warnings: Vec<String>,
}

/// Group prefix of a summary file name, if it carries an `_id<X>` suffix
pub fn group_prefix(file_name: &str) -> Option<&str> {
    summary_pattern()
        .captures(file_name)
        .and_then(|c| c.name("prefix"))
        .map(|m| m.as_str())
}

/// Summary files directly inside `data_dir`, grouped by prefix
pub fn collect_groups(data_dir: &Path) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    if !data_dir.is_dir() {
        return Err(BenchError::not_found("data directory", data_dir.display()));
    }

    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in WalkDir::new(data_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| BenchError::Other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(prefix) = group_prefix(name) {
            groups
                .entry(prefix.to_string())
                .or_default()
                .push(entry.path().to_path_buf());
        }
    }

    for files in groups.values_mut() {
        files.sort();
    }
    Ok(groups)
}

/// Average a non-empty set of summaries.
///
/// The model name of the first summary is kept; differing names are
/// reported as warnings.
pub fn average(summaries: &[(PathBuf, ModelSummary)]) -> Option<(AggregatedSummary, Vec<String>)> {
    let (_, first) = summaries.first()?;
    let runs = summaries.len() as f64;
    let mut warnings = Vec::new();

    for (path, summary) in &summaries[1..] {
        if summary.model_name != first.model_name {
            warnings.push(format!(
                "inconsistent model_name '{}' in {}; using '{}'",
                summary.model_name,
                path.display(),
                first.model_name
            ));
        }
    }

    let mean = |field: fn(&ModelSummary) -> f64| {
        summaries.iter().map(|(_, s)| field(s)).sum::<f64>() / runs
    };

    let aggregated = AggregatedSummary {
        summary: ModelSummary {
            model_name: first.model_name.clone(),
            avg_input_tokens: mean(|s| s.avg_input_tokens),
            avg_output_tokens: mean(|s| s.avg_output_tokens),
            avg_tools_called_fraction: mean(|s| s.avg_tools_called_fraction),
            avg_time_ms: mean(|s| s.avg_time_ms),
        },
        number_of_runs: summaries.len(),
    };
    Some((aggregated, warnings))
}

/// Average every group in `data_dir` and write one file per group into `summary_dir`
pub fn aggregate_directory(data_dir: &Path, summary_dir: &Path) -> Result<Vec<GroupOutcome>> {
    let groups = collect_groups(data_dir)?;
    if groups.is_empty() {
        tracing::warn!(data_dir = %data_dir.display(), "no summary files to aggregate");
        return Ok(Vec::new());
    }

    fs::create_dir_all(summary_dir).map_err(map_persist_err!(summary_dir))?;

    let mut outcomes = Vec::with_capacity(groups.len());
    for (prefix, files) in groups {
        let mut summaries = Vec::with_capacity(files.len());
        let mut warnings = Vec::new();
        for path in files {
            match read_summary(&path) {
                Ok(summary) => summaries.push((path, summary)),
                Err(e) => warnings.push(format!("skipped {}: {}", path.display(), e)),
            }
        }

        let Some((aggregated, mut group_warnings)) = average(&summaries) else {
            tracing::warn!(prefix = %prefix, "no readable summaries in group");
            continue;
        };
        warnings.append(&mut group_warnings);

        let output = summary_dir.join(format!("{}_summary.json", prefix));
        let mut json = serde_json::to_string_pretty(&aggregated)?;
        json.push('\n');
        fs::write(&output, json).map_err(map_persist_err!(&output))?;

        for warning in &warnings {
            tracing::warn!(prefix = %prefix, "{}", warning);
        }
        tracing::info!(
            prefix = %prefix,
            runs = aggregated.number_of_runs,
            output = %output.display(),
            "group_aggregated"
        );

        outcomes.push(GroupOutcome {
            prefix,
            output,
            aggregated,
            warnings,
        });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::write_summary;
    use tempfile::tempdir;

    fn summary(name: &str, input: f64, fraction: f64) -> ModelSummary {
        ModelSummary {
            model_name: name.to_string(),
            avg_input_tokens: input,
            avg_output_tokens: input / 2.0,
            avg_tools_called_fraction: fraction,
            avg_time_ms: 100.0,
        }
    }

    #[test]
    fn test_group_prefix() {
        assert_eq!(
            group_prefix("model_gpt_size1_merge2_id211_summary.json"),
            Some("model_gpt_size1_merge2")
        );
        assert_eq!(
            group_prefix("model_gpt_size1_merge2_ida1b2c3d4_summary.json"),
            Some("model_gpt_size1_merge2")
        );
        assert_eq!(group_prefix("model_gpt_size1_merge2_id211.csv"), None);
        assert_eq!(group_prefix("model_gpt_size1_merge2_summary.json"), None);
    }

    #[test]
    fn test_average_two_runs() {
        let runs = vec![
            (PathBuf::from("a"), summary("m", 10.0, 1.0)),
            (PathBuf::from("b"), summary("m", 20.0, 0.5)),
        ];
        let (aggregated, warnings) = average(&runs).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(aggregated.number_of_runs, 2);
        assert_eq!(aggregated.summary.avg_input_tokens, 15.0);
        assert_eq!(aggregated.summary.avg_output_tokens, 7.5);
        assert_eq!(aggregated.summary.avg_tools_called_fraction, 0.75);
        assert_eq!(aggregated.summary.avg_time_ms, 100.0);
    }

    #[test]
    fn test_average_warns_on_name_mismatch() {
        let runs = vec![
            (PathBuf::from("a"), summary("first", 1.0, 1.0)),
            (PathBuf::from("b"), summary("second", 1.0, 1.0)),
        ];
        let (aggregated, warnings) = average(&runs).unwrap();
        assert_eq!(aggregated.summary.model_name, "first");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("second"));
    }

    #[test]
    fn test_average_empty() {
        assert!(average(&[]).is_none());
    }

    #[test]
    fn test_aggregate_directory() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("summary");

        write_summary(
            &data.join("model_m_size2_merge1_id1_summary.json"),
            &summary("m", 10.0, 1.0),
        )
        .unwrap();
        write_summary(
            &data.join("model_m_size2_merge1_id2_summary.json"),
            &summary("m", 30.0, 0.0),
        )
        .unwrap();
        write_summary(
            &data.join("model_n_size2_merge1_id1_summary.json"),
            &summary("n", 5.0, 0.5),
        )
        .unwrap();
        fs::write(data.join("model_m_size2_merge1_id1.csv"), "ignored").unwrap();

        let outcomes = aggregate_directory(&data, &out).unwrap();
        let prefixes: Vec<_> = outcomes.iter().map(|o| o.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["model_m_size2_merge1", "model_n_size2_merge1"]);

        let written = fs::read_to_string(out.join("model_m_size2_merge1_summary.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["model_name"], "m");
        assert_eq!(value["avg_input_tokens"], 20.0);
        assert_eq!(value["avg_tools_called_fraction"], 0.5);
        assert_eq!(value["number_of_runs"], 2);

        assert_eq!(outcomes[1].aggregated.number_of_runs, 1);
    }

    #[test]
    fn test_unreadable_summary_is_skipped_with_warning() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        write_summary(
            &data.join("model_m_size1_merge1_id1_summary.json"),
            &summary("m", 10.0, 1.0),
        )
        .unwrap();
        fs::write(data.join("model_m_size1_merge1_id2_summary.json"), "not json").unwrap();

        let outcomes = aggregate_directory(&data, &dir.path().join("summary")).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].aggregated.number_of_runs, 1);
        assert_eq!(outcomes[0].warnings.len(), 1);
    }

    #[test]
    fn test_missing_data_dir() {
        let dir = tempdir().unwrap();
        let err = aggregate_directory(&dir.path().join("absent"), dir.path()).unwrap_err();
        assert!(matches!(err, BenchError::NotFound { .. }));
    }

    #[test]
    fn test_empty_data_dir_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("summary");
        let outcomes = aggregate_directory(dir.path(), &out).unwrap();
        assert!(outcomes.is_empty());
        assert!(!out.exists());
    }
}
