//! Toolbench Core Library
//!
//! Measures how reliably and cheaply chat-model backends invoke requested
//! tools: catalog loading, backend adapters, match scoring, the experiment
//! runner and summary aggregation.

pub mod aggregate;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod runner;
pub mod scorer;
pub mod summary;
pub mod trial_log;
