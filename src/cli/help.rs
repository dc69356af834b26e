//! Extended help topics
//!
//! `--help` is generated by clap; these pages add usage examples and the
//! background needed to pick sensible probe settings.

use crate::config::env::EnvManager;
use colored::*;

/// Topic help for the CLI application
pub struct HelpSystem {
    version: &'static str,
}

impl HelpSystem {
    pub const TOPICS: &'static [&'static str] = &["config", "examples", "timeout", "output"];

    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Display the overview with examples and environment variables
    pub fn display_main_help(&self, use_colors: bool) -> String {
        [
            self.format_header(use_colors),
            self.format_usage_section(use_colors),
            self.format_examples_section(use_colors),
            self.format_environment_section(use_colors),
            self.format_footer(use_colors),
        ]
        .join("\n")
    }

    /// Display help for one topic, `None` when the topic is unknown
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" | "env" | "environment" => Some(self.format_configuration_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            "timeout" | "timeouts" => Some(self.format_timeout_help(use_colors)),
            "output" | "report" => Some(self.format_output_help(use_colors)),
            _ => None,
        }
    }

    fn heading(&self, text: &str, use_colors: bool) -> String {
        if use_colors {
            text.bright_green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "AZ Latency Mesh";
        let subtitle = "Full-mesh inter-AZ latency measurements over SSH";

        if use_colors {
            format!(
                "{}\n{}\nVersion: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                self.version.green()
            )
        } else {
            format!("{}\n{}\nVersion: {}\n", title, subtitle, self.version)
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let patterns = [
            "azmesh --ssh-key <FILE> [OPTIONS]",
            "azmesh --ssh-key <FILE> --inventory <FILE> [OPTIONS]",
            "azmesh --report-from <RESULTS> [OPTIONS]",
            "azmesh --help-topic <TOPIC>",
        ];

        let mut usage = format!("{}\n", self.heading("USAGE:", use_colors));
        for pattern in patterns {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }
        usage
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ExampleHelp {
                title: "Measure every region Terraform knows about",
                command: "azmesh --ssh-key ~/.ssh/latency-mesh.pem",
                description: "Queries `terraform output -json instances` in ./terraform and probes all AZ pairs",
            },
            ExampleHelp {
                title: "Re-run against a saved inventory",
                command: "azmesh -k key.pem -i results/20260101_120000/inventory.json",
                description: "Uses the snapshot written by an earlier run instead of querying Terraform",
            },
            ExampleHelp {
                title: "Quick smoke test",
                command: "azmesh -k key.pem -c 10 -j 4 --run-timeout 300",
                description: "10 echo requests per pair, 4 probes at a time, give up after 5 minutes",
            },
            ExampleHelp {
                title: "Unprivileged ping on the nodes",
                command: "azmesh -k key.pem --interval-ms 200 --probe-timeout 90",
                description: "Older iputils reject intervals below 200ms for non-root users",
            },
            ExampleHelp {
                title: "Regenerate a report",
                command: "azmesh --report-from results/20260101_120000 --no-color",
                description: "Reloads results.json and rewrites report.txt without probing",
            },
        ];

        let mut output = format!("{}\n", self.heading("EXAMPLES:", use_colors));
        for example in examples {
            output.push_str(&example.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_environment_section(&self, use_colors: bool) -> String {
        let mut output = format!("{}\n", self.heading("ENVIRONMENT VARIABLES:", use_colors));
        output.push_str("Configuration priority: CLI arguments > Environment variables > .env file > Defaults\n\n");

        for (var_name, description, _example) in EnvManager::get_supported_env_vars() {
            if use_colors {
                output.push_str(&format!("  {}: {}\n", var_name.bright_yellow().bold(), description));
            } else {
                output.push_str(&format!("  {}: {}\n", var_name, description));
            }
        }
        output
    }

    fn format_footer(&self, use_colors: bool) -> String {
        let topics = [
            ("--help-topic config", "Configuration sources and limits"),
            ("--help-topic examples", "Usage examples"),
            ("--help-topic timeout", "Choosing probe, connect and run timeouts"),
            ("--help-topic output", "Files written per run and how to read the report"),
        ];

        let mut footer = format!("{}\n", self.heading("ADDITIONAL HELP:", use_colors));
        for (command, description) in topics {
            if use_colors {
                footer.push_str(&format!("  {}: {}\n", command.bright_yellow(), description));
            } else {
                footer.push_str(&format!("  {}: {}\n", command, description));
            }
        }
        footer
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.heading("CONFIGURATION REFERENCE:", use_colors));

        help.push_str("CONFIGURATION PRIORITY (highest to lowest):\n");
        help.push_str("1. Command-line arguments\n");
        help.push_str("2. Environment variables\n");
        help.push_str("3. .env file in the working directory\n");
        help.push_str("4. Default values\n\n");

        help.push_str("PARAMETER LIMITS:\n");
        help.push_str("- Ping count: 1-10000 (default 100)\n");
        help.push_str("- Concurrent probes per region: 1-256 (default 10)\n");
        help.push_str("- Probe timeout: 1-3600 seconds (default 60)\n");
        help.push_str("- Connect timeout: at most the probe timeout (default 10)\n\n");

        help.push_str("SSH USER DEFAULTS:\n");
        for (cloud, user) in crate::defaults::DEFAULT_SSH_USERS {
            help.push_str(&format!("- {}: {}\n", cloud, user));
        }
        help.push_str(&format!("- anything else: {}\n\n", crate::defaults::FALLBACK_SSH_USER));

        help.push_str(&EnvManager::display_env_help());
        help.push_str("\nEXAMPLE .env FILE:\n\n");
        help.push_str(&EnvManager::create_example_env_content());
        help
    }

    fn format_timeout_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.heading("PROBE TIMEOUTS:", use_colors));

        help.push_str("Each AZ pair is one probe: an SSH session to the source node running\n");
        help.push_str("`ping -c <count> -i <interval> -q <target>`.\n\n");
        help.push_str("--connect-timeout  SSH connection establishment only\n");
        help.push_str("--probe-timeout    whole probe, connection and echo train included;\n");
        help.push_str("                   expiry records the pair as `timeout`\n");
        help.push_str("--run-timeout      whole run; probes not yet finished are recorded as\n");
        help.push_str("                   `cancelled` and the partial results are still written\n\n");
        help.push_str("The echo train alone takes roughly count x interval, so 100 requests at\n");
        help.push_str("50ms need about 5s. Keep the probe timeout well above\n");
        help.push_str("count x interval + connect timeout.\n");
        help
    }

    fn format_output_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.heading("OUTPUT FILES:", use_colors));

        help.push_str("Each run writes to --output-dir (default results/<YYYYmmdd_HHMMSS>):\n\n");
        help.push_str("  inventory.json        nodes the run was planned from\n");
        help.push_str("  results.partial.json  checkpoint after each region (removed at the end)\n");
        help.push_str("  results.json          every measurement: result, skip or error\n");
        help.push_str("  report.txt            tables derived from results.json\n\n");
        help.push_str("Latency colors on the console: green below 1ms, yellow below 2ms, red above.\n");
        help.push_str("Error kinds: probe_failed, timeout, parse_failed, cancelled.\n");
        help
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for formatting examples
struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}
