//! Error types and exit codes for toolbench
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (persistence, I/O, interrupted run, failed model)
//! - 2: Usage error (bad flags/args, invalid configuration values)
//! - 3: Data error (malformed catalog, missing input file)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;

/// Exit codes for the toolbench binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data error - malformed catalog, missing input (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur while loading catalogs, running models or writing results
#[derive(Error, Debug)]
pub enum BenchError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data errors (exit code 3)
    #[error("malformed catalog{}: {reason}", entry_label(.index))]
    MalformedCatalog {
        /// Offending entry, or `None` when the document shape itself is wrong
        index: Option<usize>,
        reason: String,
    },

    #[error("{context} not found: {value}")]
    NotFound { context: String, value: String },

    // Generic failures (exit code 1)
    #[error("failed to persist {path:?}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("run interrupted before the last trial")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

fn entry_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" (entry {})", i),
        None => String::new(),
    }
}

impl BenchError {
    /// Create a catalog error for a specific entry
    pub fn malformed_entry(index: usize, reason: impl Into<String>) -> Self {
        BenchError::MalformedCatalog {
            index: Some(index),
            reason: reason.into(),
        }
    }

    /// Create a catalog error for the document as a whole
    pub fn malformed_document(reason: impl Into<String>) -> Self {
        BenchError::MalformedCatalog {
            index: None,
            reason: reason.into(),
        }
    }

    /// Create an error for a failed write to a log or summary file
    pub fn persistence(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        BenchError::Persistence {
            path: path.into(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        BenchError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an entity that was not found
    pub fn not_found(context: &str, value: impl std::fmt::Display) -> Self {
        BenchError::NotFound {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            BenchError::UsageError(_) | BenchError::InvalidValue { .. } => ExitCode::Usage,

            BenchError::MalformedCatalog { .. } | BenchError::NotFound { .. } => ExitCode::Data,

            BenchError::Persistence { .. }
            | BenchError::Backend(_)
            | BenchError::Io(_)
            | BenchError::Yaml(_)
            | BenchError::Json(_)
            | BenchError::Toml(_)
            | BenchError::Interrupted
            | BenchError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            BenchError::UsageError(_) => "usage_error",
            BenchError::InvalidValue { .. } => "invalid_value",
            BenchError::MalformedCatalog { .. } => "malformed_catalog",
            BenchError::NotFound { .. } => "not_found",
            BenchError::Persistence { .. } => "persistence_failure",
            BenchError::Backend(_) => "backend_failure",
            BenchError::Io(_) => "io_error",
            BenchError::Yaml(_) => "yaml_error",
            BenchError::Json(_) => "json_error",
            BenchError::Toml(_) => "toml_error",
            BenchError::Interrupted => "interrupted",
            BenchError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        let mut error_obj = serde_json::json!({
            "code": self.exit_code() as i32,
            "type": self.error_type(),
            "message": self.to_string(),
        });

        if let BenchError::MalformedCatalog {
            index: Some(index), ..
        } = self
        {
            error_obj["entry"] = serde_json::json!(index);
        }

        serde_json::json!({ "error": error_obj })
    }
}

/// Result type alias for toolbench operations
pub type Result<T> = std::result::Result<T, BenchError>;
