//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Defaults, then `.env`, then the environment, then the command line
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        let explicit_connect_timeout = self.cli.connect_timeout.is_some()
            || std::env::var("CONNECT_TIMEOUT_SECONDS").is_ok_and(|v| !v.trim().is_empty());

        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        // A short --probe-timeout alone must not trip over the connect default
        if !explicit_connect_timeout {
            config.connect_timeout_seconds = config.connect_timeout_seconds.min(config.probe_timeout_seconds);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(path) = &cli.inventory {
            config.inventory_file = Some(path.clone());
        }
        if let Some(dir) = &cli.terraform_dir {
            config.terraform_dir = dir.clone();
        }
        if let Some(dir) = &cli.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(key) = &cli.ssh_key {
            config.ssh_key = Some(key.clone());
        }
        if let Some(user) = &cli.ssh_user {
            config.ssh_user = Some(user.clone());
        }
        if let Some(count) = cli.ping_count {
            config.ping_count = count;
        }
        if let Some(workers) = cli.max_workers {
            config.max_concurrency = workers;
        }
        if let Some(interval) = cli.interval_ms {
            config.probe_interval_ms = interval;
        }
        if let Some(secs) = cli.probe_timeout {
            config.probe_timeout_seconds = secs;
        }
        if let Some(secs) = cli.connect_timeout {
            config.connect_timeout_seconds = secs;
        }
        if let Some(secs) = cli.run_timeout {
            config.run_timeout_seconds = Some(secs);
        }
        if cli.no_checkpoint {
            config.checkpoint = false;
        }
        if cli.no_color {
            config.enable_color = false;
        }

        // CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    match &config.inventory_file {
        Some(file) => summary.push(format!("Inventory: {}", file.display())),
        None => summary.push(format!("Inventory: terraform output in {}", config.terraform_dir.display())),
    }
    summary.push(format!(
        "SSH Key: {}",
        config
            .ssh_key
            .as_ref()
            .map(|k| k.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    ));
    summary.push(format!(
        "SSH User: {}",
        config.ssh_user.as_deref().unwrap_or("(per cloud)")
    ));
    summary.push(format!("Ping Count: {}", config.ping_count));
    summary.push(format!("Interval: {}ms", config.probe_interval_ms));
    summary.push(format!("Max Concurrency: {}", config.max_concurrency));
    summary.push(format!(
        "Timeouts: probe {}s, connect {}s, run {}",
        config.probe_timeout_seconds,
        config.connect_timeout_seconds,
        config
            .run_timeout_seconds
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "unbounded".to_string())
    ));
    summary.push(format!("Checkpoint: {}", config.checkpoint));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "azmesh",
            "--inventory",
            "inv.json",
            "--ssh-key",
            "key.pem",
            "--ping-count",
            "20",
            "--max-workers",
            "3",
            "--run-timeout",
            "120",
            "--no-checkpoint",
            "--no-color",
            "--verbose",
        ]);
        let mut config = Config::default();
        ConfigParser::new(cli).apply_cli_overrides(&mut config);

        assert_eq!(config.inventory_file, Some(PathBuf::from("inv.json")));
        assert_eq!(config.ssh_key, Some(PathBuf::from("key.pem")));
        assert_eq!(config.ping_count, 20);
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.run_timeout_seconds, Some(120));
        assert!(!config.checkpoint);
        assert!(!config.enable_color);
        assert!(config.verbose);
        assert!(!config.debug);
    }

    #[test]
    fn test_absent_flags_keep_existing_values() {
        let cli = Cli::parse_from(["azmesh"]);
        let mut config = Config {
            ping_count: 42,
            ssh_user: Some("ubuntu".to_string()),
            ..Default::default()
        };
        ConfigParser::new(cli).apply_cli_overrides(&mut config);

        assert_eq!(config.ping_count, 42);
        assert_eq!(config.ssh_user.as_deref(), Some("ubuntu"));
        assert!(config.checkpoint);
        assert!(config.enable_color);
    }

    #[test]
    fn test_cli_overrides_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PARALLEL_JOBS", "8");
        env::set_var("SSH_USER", "azureuser");

        let cli = Cli::parse_from(["azmesh", "--max-workers", "12"]);
        let result = ConfigParser::new(cli).parse();

        env::remove_var("PARALLEL_JOBS");
        env::remove_var("SSH_USER");

        let config = result.unwrap();
        assert_eq!(config.max_concurrency, 12);
        assert_eq!(config.ssh_user.as_deref(), Some("azureuser"));
    }

    #[test]
    fn test_default_connect_timeout_follows_short_probe_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let config = ConfigParser::new(Cli::parse_from(["azmesh", "--probe-timeout", "5"]))
            .parse()
            .unwrap();
        assert_eq!(config.probe_timeout_seconds, 5);
        assert_eq!(config.connect_timeout_seconds, 5);

        let config = ConfigParser::new(Cli::parse_from(["azmesh", "--probe-timeout", "30"]))
            .parse()
            .unwrap();
        assert_eq!(config.connect_timeout_seconds, crate::defaults::DEFAULT_CONNECT_TIMEOUT.as_secs());
    }

    #[test]
    fn test_explicit_connect_timeout_is_not_clamped() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CONNECT_TIMEOUT_SECONDS", "10");

        let result = ConfigParser::new(Cli::parse_from(["azmesh", "--probe-timeout", "5"])).parse();
        env::remove_var("CONNECT_TIMEOUT_SECONDS");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("cannot exceed probe timeout"));
    }

    #[test]
    fn test_invalid_env_var_is_config_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PING_COUNT", "lots");

        let result = ConfigParser::new(Cli::parse_from(["azmesh"])).parse();
        env::remove_var("PING_COUNT");

        let err = result.unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("PING_COUNT"));
    }

    #[test]
    fn test_config_summary() {
        let summary = display_config_summary(&Config::default());

        assert!(summary.contains("Inventory: terraform output in terraform"));
        assert!(summary.contains("SSH Key: (not set)"));
        assert!(summary.contains("Ping Count: 100"));
        assert!(summary.contains("run unbounded"));
    }
}
