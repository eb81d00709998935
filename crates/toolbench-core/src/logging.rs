use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Helper macro for logging elapsed time at trace level.
///
/// Usage:
/// ```rust,ignore
/// let start = Instant::now();
/// // ... some work ...
/// trace_time!(start, "load_catalog");
/// // Or with additional fields:
/// trace_time!(start, "load_catalog", entries = catalog.len());
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $name:expr) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $name);
    };
    ($start:expr, $name:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $($field = $value),*, $name);
    };
}

/// Initialize structured logging based on CLI arguments
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = match (verbose, log_level) {
        (true, None) => "debug",
        (false, None) => "warn",
        (_, Some(level)) => return init_with_level(level, log_json),
    };

    init_with_level(level, log_json)
}

/// Build the filter directive for a bare level or a full directive string
pub fn filter_directive(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        // The binary and the core crate log under different targets
        format!("toolbench={level},toolbench_core={level}")
    }
}

fn init_with_level(level: &str, log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Model runs are spans, so JSON output records when each one opens and closes
    let json_layer = log_json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
    });

    // Human output drops targets; binary and core events read as one stream
    let compact_layer = (!log_json).then(|| {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(resolve_filter(level))
        .with(json_layer)
        .with(compact_layer)
        .try_init()?;

    Ok(())
}

/// `RUST_LOG` wins, then `TOOLBENCH_LOG`, then the level from the command line
fn resolve_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("TOOLBENCH_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)))
}
