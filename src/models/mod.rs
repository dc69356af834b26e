//! Data models and structures for the latency mesh orchestrator

pub mod config;
pub mod measurement;
pub mod node;
pub mod run;

// Re-export main model types
pub use config::Config;
pub use measurement::{Measurement, ProbeFailure, ProbeResult, ProbeStats, SkipRecord};
pub use node::{Node, Pair};
pub use run::Run;
