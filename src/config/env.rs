//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file; variables already set in the process win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# AZ Latency Mesh Configuration
#
# Values here are defaults for every run and can be overridden by
# environment variables or command-line arguments.

# SSH private key used to reach probe nodes
# SSH_KEY=~/.ssh/latency-mesh.pem

# Login user for every node (default: ec2-user on aws, azureuser on azure)
# SSH_USER=ec2-user

# ICMP echo requests per AZ pair
# PING_COUNT=100

# Concurrent probes per region
# PARALLEL_JOBS=10

# Interval between echo requests in milliseconds
# (unprivileged ping on older systems refuses anything below 200)
# PROBE_INTERVAL_MS=50

# Budget for one probe, SSH setup included
# PROBE_TIMEOUT_SECONDS=60

# SSH connection establishment timeout
# CONNECT_TIMEOUT_SECONDS=10

# Optional budget for the whole run
# RUN_TIMEOUT_SECONDS=1800

# Read nodes from a saved inventory instead of querying Terraform
# INVENTORY_FILE=results/20260101_120000/inventory.json

# Terraform working directory for live inventory queries
# TERRAFORM_DIR=terraform

# Output directory (default: results/<timestamp>)
# OUTPUT_DIR=results/latest

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SSH_KEY", "SSH private key for probe nodes", "~/.ssh/latency-mesh.pem"),
            ("SSH_USER", "Login user override", "ec2-user"),
            ("PING_COUNT", "Echo requests per AZ pair (1-10000)", "100"),
            ("PARALLEL_JOBS", "Concurrent probes per region (1-256)", "10"),
            ("PROBE_INTERVAL_MS", "Interval between echo requests", "50"),
            ("PROBE_TIMEOUT_SECONDS", "Budget for one probe", "60"),
            ("CONNECT_TIMEOUT_SECONDS", "SSH connect timeout", "10"),
            ("RUN_TIMEOUT_SECONDS", "Budget for the whole run", "1800"),
            ("INVENTORY_FILE", "Saved inventory to read instead of Terraform", "inventory.json"),
            ("TERRAFORM_DIR", "Terraform working directory", "terraform"),
            ("OUTPUT_DIR", "Directory for results and report", "results/latest"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
