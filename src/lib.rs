//! AZ Latency Mesh
//!
//! Orchestrates full-mesh latency measurements between the availability zones
//! of each cloud region: loads an inventory of probe nodes, plans every
//! unordered AZ pair, runs bounded-concurrency ICMP echo trains over SSH and
//! aggregates the outcomes into a round-trippable run record and a report.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod output;
pub mod persist;
pub mod planner;
pub mod probe;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::{CancelHandle, Coordinator};
pub use inventory::{Inventory, InventorySource};
pub use models::{Config, Measurement, Node, Pair, Run};
pub use output::{ColoredFormatter, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use planner::{plan_pairs, plan_region, PairPlan};
pub use probe::{ProbeExecutor, RemoteChannel, RemoteProbeExecutor, SshChannel};
pub use stats::RunSummary;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PING_COUNT: u32 = 100;
    pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
    pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(50);
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_TERRAFORM_DIR: &str = "terraform";
    pub const DEFAULT_RESULTS_ROOT: &str = "results";
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Login user per cloud tag; anything else falls back to [`FALLBACK_SSH_USER`]
    pub const DEFAULT_SSH_USERS: &[(&str, &str)] = &[
        ("aws", "ec2-user"),
        ("azure", "azureuser"),
    ];
    pub const FALLBACK_SSH_USER: &str = "ec2-user";

    pub const INVENTORY_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Raw output kept on a `parse_failed` measurement
    pub const PARSE_DETAIL_LIMIT: usize = 500;

    /// Rows in the report's lowest/highest tables
    pub const REPORT_TOP_N: usize = 10;
}
