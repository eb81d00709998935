//! Tool match scoring
//!
//! An expected tool counts as matched when its name, compared
//! case-insensitively, occurs inside the result text of any execution. The
//! test is many-to-many: one execution can satisfy several expected names,
//! and an expected name may be evidenced by an unrelated result that happens
//! to contain it.

use serde::{Deserialize, Serialize};

use crate::backend::ToolExecution;

/// Outcome of scoring one trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// 0 to 100, rounded half up
    pub match_percent: u32,
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
    pub diagnostic: String,
}

impl MatchReport {
    /// Zero-match report carrying a diagnostic, used for failed invocations
    pub fn failed(expected: &[String], diagnostic: impl Into<String>) -> Self {
        Self {
            match_percent: 0,
            matched: Vec::new(),
            unmatched: expected.to_vec(),
            diagnostic: diagnostic.into(),
        }
    }
}

/// Score observed executions against the expected tool names
pub fn score(expected: &[String], executions: &[ToolExecution], final_response: &str) -> MatchReport {
    if executions.is_empty() || expected.is_empty() {
        return MatchReport::failed(
            expected,
            format!(
                "Executions are empty or tools were not called: {}",
                final_response
            ),
        );
    }

    let results: Vec<String> = executions.iter().map(|e| e.result.to_lowercase()).collect();

    let (matched, unmatched): (Vec<String>, Vec<String>) =
        expected.iter().cloned().partition(|name| {
            let needle = name.to_lowercase();
            results.iter().any(|r| r.contains(&needle))
        });

    if !unmatched.is_empty() {
        tracing::debug!(unmatched = ?unmatched, "expected tools without evidence");
    }

    MatchReport {
        match_percent: percent(matched.len(), expected.len()),
        matched,
        unmatched,
        diagnostic: render_executions(executions),
    }
}

/// `round(100 * part / whole)` with half-up rounding in integer arithmetic
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

fn render_executions(executions: &[ToolExecution]) -> String {
    let rendered: Vec<String> = executions.iter().map(|e| e.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}
