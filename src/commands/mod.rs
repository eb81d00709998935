//! CLI commands for toolbench

pub mod aggregate;
pub mod dispatch;
pub mod models;
pub mod run;
pub mod summarize;
pub mod validate;
