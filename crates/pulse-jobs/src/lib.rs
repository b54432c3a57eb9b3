//! Batch jobs behind the `pulse-jobs` binary: market scans, mover and
//! news ingestion, model summaries and the daily scheduler.

pub mod config;
pub mod context;
pub mod jobs;
pub mod schedule;

pub use config::JobsConfig;
pub use context::JobContext;
