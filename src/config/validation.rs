//! Configuration validation utilities and rules
//!
//! [`Config::validate`] rejects values that cannot work at all. The checks
//! here only produce warnings about settings that are legal but likely to
//! give misleading or slow results.

use crate::{error::Result, models::Config};
use colored::Colorize;
use std::time::Duration;

/// Linux iputils refuses shorter intervals without CAP_NET_RAW
const UNPRIVILEGED_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// Configuration validator with advanced validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_probe_settings(config));
        warnings.extend(Self::validate_concurrency(config));
        warnings.extend(Self::validate_paths(config));
        Ok(warnings)
    }

    fn validate_probe_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let train = config.echo_train_duration();
        let budget = config.probe_timeout();

        if train + config.connect_timeout() >= budget {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Echo train of {} x {}ms ({:.1}s) plus {}s connect timeout does not fit in the {}s probe timeout; probes will time out",
                    config.ping_count,
                    config.probe_interval_ms,
                    train.as_secs_f64(),
                    config.connect_timeout_seconds,
                    config.probe_timeout_seconds
                ),
            ));
        }

        if config.probe_interval() < UNPRIVILEGED_MIN_INTERVAL {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Interval of {}ms needs privileged ping on the probe nodes (unprivileged minimum is {}ms)",
                    config.probe_interval_ms,
                    UNPRIVILEGED_MIN_INTERVAL.as_millis()
                ),
            ));
        }

        if config.ping_count < 10 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Ping count of {} may not provide reliable statistics (recommended: >= 10)",
                    config.ping_count
                ),
            ));
        }

        if let Some(run_timeout) = config.run_timeout() {
            if run_timeout < budget {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "Run timeout of {}s is shorter than a single probe timeout ({}s)",
                        run_timeout.as_secs(),
                        config.probe_timeout_seconds
                    ),
                ));
            }
        }

        warnings
    }

    fn validate_concurrency(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.max_concurrency > 32 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} concurrent probes per region may trip SSH rate limits (MaxStartups) on the probe nodes",
                    config.max_concurrency
                ),
            ));
        } else if config.max_concurrency == 1 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Probes run one at a time; large regions will take a while".to_string(),
            ));
        }

        warnings
    }

    fn validate_paths(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let Some(key) = &config.ssh_key {
            if !key.is_file() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("SSH key '{}' does not exist", key.display()),
                ));
            }
        }

        match &config.inventory_file {
            Some(file) if !file.is_file() => warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Inventory file '{}' does not exist", file.display()),
            )),
            None if !config.terraform_dir.is_dir() => warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Terraform directory '{}' does not exist; pass --inventory to use a saved inventory",
                    config.terraform_dir.display()
                ),
            )),
            _ => {}
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if !use_color {
            return format!("[{}] {}", self.level.as_str(), self.message);
        }
        let tag = match self.level {
            ValidationLevel::Info => self.level.as_str().blue(),
            ValidationLevel::Warning => self.level.as_str().yellow().bold(),
        };
        format!("[{}] {}", tag, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_with_paths(temp: &TempDir) -> Config {
        let key = temp.path().join("id_ed25519");
        let inventory = temp.path().join("inventory.json");
        std::fs::write(&key, "key").unwrap();
        std::fs::write(&inventory, "{}").unwrap();
        Config {
            ssh_key: Some(key),
            inventory_file: Some(inventory),
            probe_interval_ms: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let temp = TempDir::new().unwrap();
        let warnings = validate_config(&config_with_paths(&temp)).unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let config = Config {
            ping_count: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_echo_train_exceeding_timeout() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            ping_count: 1000,
            probe_timeout_seconds: 60,
            ..config_with_paths(&temp)
        };
        let warnings = validate_config(&config).unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.level == ValidationLevel::Warning && w.message.contains("does not fit")));
    }

    #[test]
    fn test_fast_interval_is_informational() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            probe_interval_ms: 50,
            ..config_with_paths(&temp)
        };
        let warnings = validate_config(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, ValidationLevel::Info);
    }

    #[test]
    fn test_missing_paths_warn() {
        let config = Config {
            ssh_key: Some(PathBuf::from("/nonexistent/key")),
            inventory_file: Some(PathBuf::from("/nonexistent/inventory.json")),
            probe_interval_ms: 200,
            ..Default::default()
        };
        let warnings = validate_config(&config).unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_high_concurrency_warns() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            max_concurrency: 64,
            ..config_with_paths(&temp)
        };
        let warnings = validate_config(&config).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("MaxStartups")));
    }

    #[test]
    fn test_plain_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "careful".to_string());
        assert_eq!(warning.format(false), "[WARNING] careful");
    }
}
