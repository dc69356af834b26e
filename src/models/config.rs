//! Configuration data model and validation

use crate::types::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of ICMP echo requests per measurement
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Concurrent probes per region
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Interval between echo requests in milliseconds
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    /// Budget for one probe, channel setup included
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_seconds: u64,

    /// SSH connection establishment timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_seconds: u64,

    /// Optional budget for the whole campaign
    #[serde(default)]
    pub run_timeout_seconds: Option<u64>,

    /// SSH private key used to reach probe sources
    #[serde(default)]
    pub ssh_key: Option<PathBuf>,

    /// SSH username override; per-cloud defaults apply when unset
    #[serde(default)]
    pub ssh_user: Option<String>,

    /// Saved inventory file; when unset the inventory is queried from Terraform
    #[serde(default)]
    pub inventory_file: Option<PathBuf>,

    /// Terraform working directory for live inventory queries
    #[serde(default = "default_terraform_dir")]
    pub terraform_dir: PathBuf,

    /// Output directory; defaults to `results/<timestamp>`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Write an atomic checkpoint after each region
    #[serde(default = "default_checkpoint")]
    pub checkpoint: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ping_count: default_ping_count(),
            max_concurrency: default_max_concurrency(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_seconds: default_probe_timeout_secs(),
            connect_timeout_seconds: default_connect_timeout_secs(),
            run_timeout_seconds: None,
            ssh_key: None,
            ssh_user: None,
            inventory_file: None,
            terraform_dir: default_terraform_dir(),
            output_dir: None,
            checkpoint: default_checkpoint(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_seconds.map(Duration::from_secs)
    }

    /// Nominal duration of one echo train, excluding channel setup
    pub fn echo_train_duration(&self) -> Duration {
        self.probe_interval() * self.ping_count
    }

    /// Output directory, resolving the timestamped default against `now`
    pub fn resolved_output_dir(&self, now: DateTime<Utc>) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => Path::new(crate::defaults::DEFAULT_RESULTS_ROOT)
                .join(now.format("%Y%m%d_%H%M%S").to_string()),
        }
    }

    /// SSH key path, required for any run that actually probes
    pub fn require_ssh_key(&self) -> Result<&Path> {
        self.ssh_key
            .as_deref()
            .ok_or_else(|| AppError::config("An SSH private key is required (use --ssh-key or set SSH_KEY)"))
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.ping_count == 0 {
            return Err(AppError::config("Ping count must be greater than 0"));
        }

        if self.ping_count > 10_000 {
            return Err(AppError::config("Ping count cannot exceed 10000"));
        }

        if self.max_concurrency == 0 {
            return Err(AppError::config("Concurrency bound must be greater than 0"));
        }

        if self.max_concurrency > 256 {
            return Err(AppError::config("Concurrency bound cannot exceed 256"));
        }

        if self.probe_interval_ms == 0 {
            return Err(AppError::config("Probe interval must be greater than 0 ms"));
        }

        if self.probe_timeout_seconds == 0 {
            return Err(AppError::config("Probe timeout must be greater than 0"));
        }

        if self.probe_timeout_seconds > 3600 {
            return Err(AppError::config("Probe timeout cannot exceed 3600 seconds"));
        }

        if self.connect_timeout_seconds == 0 {
            return Err(AppError::config("Connect timeout must be greater than 0"));
        }

        if self.connect_timeout_seconds > self.probe_timeout_seconds {
            return Err(AppError::config(format!(
                "Connect timeout ({}s) cannot exceed probe timeout ({}s)",
                self.connect_timeout_seconds, self.probe_timeout_seconds
            )));
        }

        if self.run_timeout_seconds == Some(0) {
            return Err(AppError::config("Run timeout must be greater than 0 when set"));
        }

        if let Some(user) = &self.ssh_user {
            if user.trim().is_empty() || user.contains(char::is_whitespace) || user.contains('@') {
                return Err(AppError::config(format!("Invalid SSH user: '{}'", user)));
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(value) = env_value("SSH_KEY") {
            self.ssh_key = Some(PathBuf::from(value));
        }

        if let Some(value) = env_value("SSH_USER") {
            self.ssh_user = Some(value);
        }

        if let Some(value) = env_value("PING_COUNT") {
            self.ping_count = value.parse()
                .map_err(|e| AppError::config(format!("Invalid PING_COUNT value '{}': {}", value, e)))?;
        }

        if let Some(value) = env_value("PARALLEL_JOBS") {
            self.max_concurrency = value.parse()
                .map_err(|e| AppError::config(format!("Invalid PARALLEL_JOBS value '{}': {}", value, e)))?;
        }

        if let Some(value) = env_value("PROBE_INTERVAL_MS") {
            self.probe_interval_ms = value.parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_INTERVAL_MS value '{}': {}", value, e)))?;
        }

        if let Some(value) = env_value("PROBE_TIMEOUT_SECONDS") {
            self.probe_timeout_seconds = value.parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
        }

        if let Some(value) = env_value("CONNECT_TIMEOUT_SECONDS") {
            self.connect_timeout_seconds = value.parse()
                .map_err(|e| AppError::config(format!("Invalid CONNECT_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
        }

        if let Some(value) = env_value("RUN_TIMEOUT_SECONDS") {
            self.run_timeout_seconds = Some(value.parse()
                .map_err(|e| AppError::config(format!("Invalid RUN_TIMEOUT_SECONDS value '{}': {}", value, e)))?);
        }

        if let Some(value) = env_value("INVENTORY_FILE") {
            self.inventory_file = Some(PathBuf::from(value));
        }

        if let Some(value) = env_value("TERRAFORM_DIR") {
            self.terraform_dir = PathBuf::from(value);
        }

        if let Some(value) = env_value("OUTPUT_DIR") {
            self.output_dir = Some(PathBuf::from(value));
        }

        if let Some(value) = env_value("ENABLE_COLOR") {
            self.enable_color = value.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
        }

        Ok(())
    }
}

/// Non-empty, trimmed value of an environment variable
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Default value functions for serde
fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_max_concurrency() -> usize {
    crate::defaults::DEFAULT_MAX_CONCURRENCY
}

fn default_probe_interval_ms() -> u64 {
    crate::defaults::DEFAULT_PROBE_INTERVAL.as_millis() as u64
}

fn default_probe_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PROBE_TIMEOUT.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_terraform_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_TERRAFORM_DIR)
}

fn default_checkpoint() -> bool {
    true
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
