//! Output formatting and display system
//!
//! Renders a [`RunSummary`] as the plain-text report written next to the run
//! results, and as a shorter console summary in plain or colored form.

mod colored;
mod formatter;

pub use self::colored::{latency_color, ColorScheme, ColoredFormatter};
pub use formatter::{
    format_ms, format_optional_ms, Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter,
    RowData, TableFormat,
};

use crate::{defaults::REPORT_TOP_N, error::Result, stats::RunSummary};

pub const REPORT_TITLE: &str = "Inter-AZ Latency Report";

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            ..Default::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Formatter for files: never colored, error details included
    pub fn create_report_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}

/// Assembles report sections in order
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
    top_n: usize,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self {
            formatter,
            top_n: REPORT_TOP_N,
        }
    }

    /// Coordinator producing the on-disk report
    pub fn for_report() -> Self {
        Self::new(OutputFormatterFactory::create_report_formatter())
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Full report
    pub fn render_report(&self, summary: &RunSummary) -> Result<String> {
        let mut sections = vec![
            self.formatter.format_header(REPORT_TITLE)?,
            self.formatter.format_run_overview(summary)?,
            self.formatter.format_key_findings(summary)?,
        ];

        for region in &summary.regions {
            sections.push(self.formatter.format_region_table(region)?);
        }

        if summary.total_results > 0 {
            sections.push(self.formatter.format_rankings(summary, self.top_n)?);
            sections.push(self.formatter.format_region_overview(summary)?);
        }
        sections.push(self.formatter.format_errors(summary)?);
        sections.push(self.formatter.format_methodology(summary)?);

        Ok(join_sections(sections))
    }

    /// Counts, key findings and per-region overview
    pub fn render_console_summary(&self, summary: &RunSummary) -> Result<String> {
        let mut sections = vec![
            self.formatter.format_run_overview(summary)?,
            self.formatter.format_key_findings(summary)?,
        ];
        if summary.total_results > 0 {
            sections.push(self.formatter.format_region_overview(summary)?);
        }
        if summary.total_errors > 0 {
            sections.push(self.formatter.format_errors(summary)?);
        }
        Ok(join_sections(sections))
    }

    pub fn display_error(&self, message: &str) -> Result<String> {
        self.formatter.format_error(message)
    }

    pub fn display_warning(&self, message: &str) -> Result<String> {
        self.formatter.format_warning(message)
    }

    pub fn display_success(&self, message: &str) -> Result<String> {
        self.formatter.format_success(message)
    }
}

fn join_sections(sections: Vec<String>) -> String {
    let mut output = sections.join("\n\n");
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::{fixtures::node, Pair};
    use crate::models::{Measurement, ProbeStats, Run};
    use crate::types::ProbeErrorKind;

    fn pair(a: &str, b: &str) -> Pair {
        Pair::new("us-east-1", node("us-east-1", a), node("us-east-1", b))
    }

    fn result(a: &str, b: &str, avg_ms: f64) -> Measurement {
        let stats = ProbeStats {
            min_ms: avg_ms - 0.1,
            avg_ms,
            max_ms: avg_ms + 0.1,
            mdev_ms: 0.02,
            packet_loss_pct: 0.0,
        };
        Measurement::result(&pair(a, b), stats, 100)
    }

    fn summary() -> RunSummary {
        let mut run = Run::new(100, vec!["us-east-1".to_string()], vec!["aws".to_string()]);
        run.record(result("use1-az1", "use1-az2", 0.612));
        run.record(result("use1-az1", "use1-az4", 1.204));
        run.record(Measurement::error(
            &pair("use1-az2", "use1-az4"),
            ProbeErrorKind::ParseFailed,
            Some("garbage".to_string()),
        ));
        run.finalize();
        RunSummary::from_run(&run)
    }

    #[test]
    fn test_report_sections_in_order() {
        let report = OutputCoordinator::for_report().render_report(&summary()).unwrap();

        let positions: Vec<usize> = [
            REPORT_TITLE,
            "Measurement Summary",
            "Key Findings",
            "us-east-1\n---------",
            "Top 10 Lowest Latency AZ Pairs",
            "Top 10 Highest Latency AZ Pairs",
            "Per-Region Latency Summary",
            "Errors\n------",
            "Methodology",
        ]
        .iter()
        .map(|needle| report.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_report_contents() {
        let report = OutputCoordinator::for_report().render_report(&summary()).unwrap();

        assert!(report.contains("Lowest latency:   use1-az1<->use1-az2 (us-east-1) = 0.612ms"));
        assert!(report.contains("Highest latency:  use1-az1<->use1-az4 (us-east-1) = 1.204ms"));
        assert!(report.contains("Average latency across all AZ pairs: 0.908ms"));
        assert!(report.contains("parse_failed: 1"));
        assert!(report.contains("garbage"));
        assert!(report.contains("100 packets per measurement"));
        assert!(!report.contains('\u{1b}'));
    }

    #[test]
    fn test_empty_run_report() {
        let run = Run::new(100, Vec::new(), Vec::new());
        let report = OutputCoordinator::for_report()
            .render_report(&RunSummary::from_run(&run))
            .unwrap();

        assert!(report.contains("No measurement results found."));
        assert!(!report.contains("Top 10"));
    }

    #[test]
    fn test_console_summary_plain() {
        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_formatter(false, false));
        let text = coordinator.render_console_summary(&summary()).unwrap();

        assert!(text.contains("Total measurements:      3"));
        assert!(text.contains("Per-Region Latency Summary"));
        assert!(!text.contains("garbage"));
    }
}
