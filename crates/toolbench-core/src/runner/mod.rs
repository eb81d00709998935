//! Experiment execution
//!
//! For each registered model, every catalog entry is sent to the backend in
//! catalog order, timed, scored and appended to the model's log before the
//! next entry starts. After the last entry the model's summary is written.
//! Models are independent and may run on a bounded pool of workers.

pub mod pool;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::backend::{ChatBackend, ChatMessage, ModelRegistry, TokenUsage, ToolDeclaration};
use crate::catalog::{Catalog, ToolCatalogEntry};
use crate::config::{ElapsedMode, HarnessConfig};
use crate::error::{BenchError, Result};
use crate::map_persist_err;
use crate::paths::OutputPaths;
use crate::scorer::{self, MatchReport};
use crate::summary::{self, ModelSummary, RunningTotals};
use crate::trace_time;
use crate::trial_log::{TrialLog, TrialRow};

/// Instruction prepended to every prompt, identical for all trials and models
pub const HARNESS_PREAMBLE: &str = "You are autonomous tool assistant that executes tools without \
requiring additional questions. If some additional information is requested, create them for \
demo purposes.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub data_dir: PathBuf,
    pub elapsed_mode: ElapsedMode,
    pub jobs: usize,
}

impl From<&HarnessConfig> for RunOptions {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            elapsed_mode: config.elapsed,
            jobs: config.jobs,
        }
    }
}

/// Result of one (model, entry) trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRecord {
    pub trial_key: String,
    pub usage: TokenUsage,
    pub elapsed_ms: u64,
    pub report: MatchReport,
    /// The backend returned an error instead of a response
    pub failed: bool,
}

impl TrialRecord {
    fn to_row(&self, logged_elapsed_ms: u64) -> TrialRow {
        TrialRow {
            trial_key: self.trial_key.clone(),
            input_tokens: self.usage.input,
            output_tokens: self.usage.output,
            elapsed_ms: logged_elapsed_ms,
            match_percent: self.report.match_percent,
            matched: self.report.matched.clone(),
            unmatched: self.report.unmatched.clone(),
            diagnostic: self.report.diagnostic.clone(),
        }
    }
}

/// What happened to one model's run
#[derive(Debug)]
pub struct ModelOutcome {
    pub model: String,
    pub paths: OutputPaths,
    pub result: Result<ModelSummary>,
}

/// Callback invoked after each trial with the model name
pub type TrialObserver<'a> = &'a (dyn Fn(&str, &TrialRecord) + Sync);

pub struct Runner<'a> {
    catalog: &'a Catalog,
    tools: Vec<ToolDeclaration>,
    options: RunOptions,
    interrupt: Arc<AtomicBool>,
    observer: Option<TrialObserver<'a>>,
}

impl<'a> Runner<'a> {
    pub fn new(catalog: &'a Catalog, options: RunOptions) -> Self {
        Self {
            catalog,
            tools: catalog.declared_tools(),
            options,
            interrupt: Arc::new(AtomicBool::new(false)),
            observer: None,
        }
    }

    /// Share a flag that, once set, stops every model before its next trial
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_observer(mut self, observer: TrialObserver<'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn paths_for(&self, model: &str) -> OutputPaths {
        OutputPaths::new(&self.options.data_dir, model, &self.catalog.identity())
    }

    /// Run every registered model; outcomes come back in registration order
    pub fn run(&self, registry: &ModelRegistry) -> Vec<ModelOutcome> {
        let models = registry.models();
        pool::run_bounded(models.len(), self.options.jobs, |i| {
            let backend = models[i].as_ref();
            let result = self.run_model(backend);
            if let Err(e) = &result {
                tracing::error!(model = %backend.name(), error = %e, "model run failed");
            }
            ModelOutcome {
                model: backend.name().to_string(),
                paths: self.paths_for(backend.name()),
                result,
            }
        })
    }

    /// Run all catalog entries against one backend and write its summary
    #[tracing::instrument(skip_all, fields(model = %backend.name()))]
    pub fn run_model(&self, backend: &dyn ChatBackend) -> Result<ModelSummary> {
        let start = Instant::now();
        let paths = self.paths_for(backend.name());
        tracing::info!(
            log = %paths.log.display(),
            entries = self.catalog.len(),
            "model_start"
        );

        // A summary from an earlier run must not sit beside a new partial log
        if paths.summary.exists() {
            std::fs::remove_file(&paths.summary).map_err(map_persist_err!(&paths.summary))?;
        }
        let mut log = TrialLog::create(&paths.log, self.options.elapsed_mode)?;

        let mut totals = RunningTotals::default();
        for entry in self.catalog.entries() {
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::warn!(completed = totals.trials, "interrupted");
                return Err(BenchError::Interrupted);
            }

            let trial = run_trial(backend, entry, &self.tools);

            let logged_elapsed_ms = match self.options.elapsed_mode {
                ElapsedMode::Cumulative => totals.elapsed_ms + trial.elapsed_ms,
                ElapsedMode::PerTrial => trial.elapsed_ms,
            };
            log.append(&trial.to_row(logged_elapsed_ms))?;

            totals.record(
                trial.usage.input,
                trial.usage.output,
                trial.report.match_percent,
                trial.elapsed_ms,
            );

            tracing::info!(
                trial = %trial.trial_key,
                input_tokens = trial.usage.input,
                output_tokens = trial.usage.output,
                elapsed_ms = trial.elapsed_ms,
                match_percent = trial.report.match_percent,
                "trial_complete"
            );
            if let Some(observer) = self.observer {
                observer(backend.name(), &trial);
            }
        }

        let summary = summary::summarize(backend.name(), &totals);
        summary::write_summary(&paths.summary, &summary)?;
        trace_time!(start, "model_run", trials = totals.trials);
        tracing::info!(summary = %paths.summary.display(), "model_finish");
        Ok(summary)
    }
}

/// Messages sent for one catalog entry
pub fn harness_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(HARNESS_PREAMBLE), ChatMessage::user(prompt)]
}

/// Invoke the backend once for an entry, timing and scoring the call.
///
/// Backend errors never propagate: they become a zero-match trial whose
/// diagnostic carries the error text.
pub fn run_trial(
    backend: &dyn ChatBackend,
    entry: &ToolCatalogEntry,
    tools: &[ToolDeclaration],
) -> TrialRecord {
    let messages = harness_messages(entry.prompt());

    let start = Instant::now();
    let outcome = backend.invoke(&messages, tools);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => TrialRecord {
            trial_key: entry.trial_key().to_string(),
            usage: result.usage.unwrap_or_default(),
            elapsed_ms,
            report: scorer::score(entry.tools(), &result.executions, &result.text),
            failed: false,
        },
        Err(e) => {
            tracing::warn!(trial = %entry.trial_key(), error = %e, "backend invocation failed");
            TrialRecord {
                trial_key: entry.trial_key().to_string(),
                usage: TokenUsage::default(),
                elapsed_ms,
                report: MatchReport::failed(entry.tools(), format!("Backend error: {}", e)),
                failed: true,
            }
        }
    }
}
