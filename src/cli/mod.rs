//! Command-line interface module

pub mod help;

pub use help::HelpSystem;

use clap::Parser;
use std::path::PathBuf;

/// AZ Latency Mesh - full-mesh inter-AZ latency measurements over SSH
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "azmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Read nodes from a saved inventory file instead of querying Terraform
    #[arg(short, long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Terraform working directory for the live inventory query
    #[arg(long, value_name = "DIR")]
    pub terraform_dir: Option<PathBuf>,

    /// Directory for inventory snapshot, results and report
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// SSH private key used to reach probe nodes
    #[arg(short = 'k', long, value_name = "FILE")]
    pub ssh_key: Option<PathBuf>,

    /// Login user for every node (default depends on the node's cloud)
    #[arg(short = 'u', long, value_name = "USER")]
    pub ssh_user: Option<String>,

    /// ICMP echo requests per AZ pair
    #[arg(short = 'c', long, value_name = "N")]
    pub ping_count: Option<u32>,

    /// Concurrent probes per region
    #[arg(short = 'j', long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Interval between echo requests in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Budget for one probe in seconds, SSH setup included
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub probe_timeout: Option<u64>,

    /// SSH connect timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub connect_timeout: Option<u64>,

    /// Budget for the whole run in seconds; unfinished probes are recorded as cancelled
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub run_timeout: Option<u64>,

    /// Do not write results.partial.json after each region
    #[arg(long)]
    pub no_checkpoint: bool,

    /// Regenerate the report from a saved results file or run directory, without probing
    #[arg(long, value_name = "PATH")]
    pub report_from: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Show help for specific topic (config, examples, timeout, output)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.report_from.is_some() && self.inventory.is_some() {
            return Err("--report-from does not probe; it cannot be combined with --inventory".to_string());
        }

        if let (Some(connect), Some(probe)) = (self.connect_timeout, self.probe_timeout) {
            if connect > probe {
                return Err(format!(
                    "--connect-timeout ({}s) cannot exceed --probe-timeout ({}s)",
                    connect, probe
                ));
            }
        }

        Ok(())
    }

    /// Report regeneration only, no probing
    pub fn is_report_mode(&self) -> bool {
        self.report_from.is_some()
    }

    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        if let Some(topic) = &self.help_topic {
            help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    HelpSystem::TOPICS.join(", "),
                    help_system.display_main_help(use_colors)
                )
            })
        } else {
            help_system.display_main_help(use_colors)
        }
    }
}

/// Parse a positive number of seconds
fn parse_seconds(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["azmesh", "--ssh-key", "/tmp/key", "--ping-count", "20"]);
        assert_eq!(cli.ssh_key, Some(PathBuf::from("/tmp/key")));
        assert_eq!(cli.ping_count, Some(20));
        assert!(cli.inventory.is_none());
        assert!(!cli.verbose);
        assert!(!cli.is_report_mode());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "azmesh",
            "--inventory",
            "inv.json",
            "--terraform-dir",
            "infra",
            "--output-dir",
            "out",
            "--ssh-key",
            "key.pem",
            "--ssh-user",
            "ubuntu",
            "--ping-count",
            "50",
            "--max-workers",
            "4",
            "--interval-ms",
            "200",
            "--probe-timeout",
            "90",
            "--connect-timeout",
            "5",
            "--run-timeout",
            "600",
            "--no-checkpoint",
            "--no-color",
            "--verbose",
            "--debug",
        ]);

        assert_eq!(cli.inventory, Some(PathBuf::from("inv.json")));
        assert_eq!(cli.terraform_dir, Some(PathBuf::from("infra")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.ssh_user.as_deref(), Some("ubuntu"));
        assert_eq!(cli.max_workers, Some(4));
        assert_eq!(cli.interval_ms, Some(200));
        assert_eq!(cli.probe_timeout, Some(90));
        assert_eq!(cli.connect_timeout, Some(5));
        assert_eq!(cli.run_timeout, Some(600));
        assert!(cli.no_checkpoint);
        assert!(cli.no_color);
        assert!(!cli.use_colors());
        assert!(cli.verbose && cli.debug);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["azmesh", "-i", "inv.json", "-k", "key", "-c", "10", "-j", "2", "-v"]);
        assert_eq!(cli.inventory, Some(PathBuf::from("inv.json")));
        assert_eq!(cli.ping_count, Some(10));
        assert_eq!(cli.max_workers, Some(2));
        assert!(cli.verbose);
    }

    #[test]
    fn test_seconds_parsing() {
        assert_eq!(parse_seconds("30"), Ok(30));
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("+5").is_err());
        assert!(parse_seconds("0x10").is_err());
        assert!(parse_seconds("ten").is_err());
        assert!(Cli::try_parse_from(["azmesh", "--probe-timeout", "0"]).is_err());
    }

    #[test]
    fn test_validation_conflicts() {
        let cli = Cli::parse_from(["azmesh", "--report-from", "results.json", "--inventory", "inv.json"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["azmesh", "--connect-timeout", "30", "--probe-timeout", "10"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["azmesh", "--report-from", "results"]);
        assert!(cli.validate().is_ok());
        assert!(cli.is_report_mode());
    }

    #[test]
    fn test_help_topic() {
        let cli = Cli::parse_from(["azmesh", "--help-topic", "timeout", "--no-color"]);
        assert!(cli.should_show_topic_help());
        assert!(cli.display_help().contains("PROBE TIMEOUTS"));

        let cli = Cli::parse_from(["azmesh", "--help-topic", "bogus", "--no-color"]);
        assert!(cli.display_help().contains("Unknown help topic: 'bogus'"));
    }
}
