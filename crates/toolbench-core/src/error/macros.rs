//! Error macros for toolbench

/// Macro for rejecting a catalog entry
#[macro_export]
macro_rules! bail_entry {
    ($index:expr, $reason:expr) => {
        return Err($crate::error::BenchError::malformed_entry($index, $reason))
    };
}

/// Macro for creating invalid value errors
#[macro_export]
macro_rules! bail_invalid {
    ($context:expr, $value:expr) => {
        return Err($crate::error::BenchError::invalid_value($context, $value))
    };
}

/// Macro for mapping write failures on a log or summary path
#[macro_export]
macro_rules! map_persist_err {
    ($path:expr) => {
        |e| $crate::error::BenchError::persistence($path, e)
    };
}
