//! Colored formatter implementation with terminal color support
//!
//! Layout is delegated to [`PlainFormatter`]; this formatter styles titles,
//! latency cells and error kinds on top of it.

use super::formatter::{
    fmt_err, format_ms, Column, FormattingOptions, OutputFormatter, PlainFormatter, TableFormat,
};
use crate::{
    error::Result,
    stats::{PairLatency, RegionSummary, RunSummary},
    types::{LatencyLevel, ProbeErrorKind},
};
use colored::*;
use std::fmt::Write as _;

/// Latency band colors
pub fn latency_color(level: LatencyLevel) -> Color {
    match level {
        LatencyLevel::Good => Color::Green,
        LatencyLevel::Moderate => Color::Yellow,
        LatencyLevel::Poor => Color::Red,
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub highlight: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            highlight: Color::Magenta,
            muted: Color::BrightBlack,
        }
    }
}

impl ColorScheme {
    fn error_kind(&self, kind: ProbeErrorKind) -> Color {
        match kind {
            ProbeErrorKind::Cancelled => self.muted,
            ProbeErrorKind::Timeout => self.warning,
            ProbeErrorKind::ProbeFailed | ProbeErrorKind::ParseFailed => self.error,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or untouched when colors are off
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    fn title(&self, title: &str) -> String {
        let underline = "-".repeat(title.chars().count());
        format!(
            "{}\n{}",
            self.emphasize(title, self.color_scheme.header),
            self.colorize(&underline, self.color_scheme.muted)
        )
    }

    fn latency(&self, avg_ms: f64) -> ColoredString {
        self.colorize(&format_ms(avg_ms), latency_color(LatencyLevel::from_ms(avg_ms)))
    }

    /// Table whose `latency_columns` cells are colored by the row's average
    fn latency_table(
        &self,
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
        averages: &[f64],
        latency_columns: &[usize],
    ) -> Result<String> {
        let format = TableFormat::new(columns, self.options.table_borders);
        let styler = |row: usize, col: usize, cell: &str| -> String {
            match averages.get(row) {
                Some(&avg) if avg.is_finite() && latency_columns.contains(&col) => {
                    self.colorize(cell, latency_color(LatencyLevel::from_ms(avg))).to_string()
                }
                _ => cell.to_string(),
            }
        };
        self.plain.create_styled_table(&format, &rows, Some(&styler))
    }

    fn ranking(&self, pairs: &[&PairLatency]) -> Result<String> {
        let averages: Vec<f64> = pairs.iter().map(|p| p.avg_ms).collect();
        self.latency_table(self.plain.ranking_columns(), self.plain.ranking_rows(pairs), &averages, &[3])
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "=".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}\n{}",
            self.colorize(&border, self.color_scheme.header),
            self.bold(title),
            self.colorize(&border, self.color_scheme.header)
        ))
    }

    fn format_run_overview(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("run overview");
        let label = |text: &str| self.colorize(text, self.color_scheme.info);

        writeln!(output, "{}", self.title("Measurement Summary")).map_err(&err)?;
        writeln!(output, "{}  {}", label("Started:               "), summary.started_at.to_rfc3339())
            .map_err(&err)?;
        if let Some(finished) = summary.finished_at {
            writeln!(output, "{}  {}", label("Finished:              "), finished.to_rfc3339()).map_err(&err)?;
        }
        if !summary.clouds.is_empty() {
            writeln!(output, "{}  {}", label("Clouds:                "), summary.clouds.join(", ")).map_err(&err)?;
        }
        writeln!(output, "{}  {}", label("Regions covered:       "), summary.regions.len()).map_err(&err)?;
        writeln!(output, "{}  {}", label("Probes per measurement:"), summary.probe_count).map_err(&err)?;
        writeln!(output, "{}  {}", label("Total measurements:    "), summary.total_measurements).map_err(&err)?;
        writeln!(
            output,
            "{}  {}",
            label("Results:               "),
            self.colorize(&summary.total_results.to_string(), self.color_scheme.success)
        )
        .map_err(&err)?;
        let error_color = if summary.total_errors > 0 {
            self.color_scheme.error
        } else {
            self.color_scheme.success
        };
        writeln!(
            output,
            "{}  {}",
            label("Errors:                "),
            self.colorize(&summary.total_errors.to_string(), error_color)
        )
        .map_err(&err)?;
        write!(output, "{}  {}", label("Skipped:               "), summary.total_skips).map_err(&err)?;

        Ok(output)
    }

    fn format_key_findings(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("key findings");

        writeln!(output, "{}", self.title("Key Findings")).map_err(&err)?;
        match (summary.fastest(), summary.slowest(), summary.overall_mean_ms()) {
            (Some(low), Some(high), Some(mean)) => {
                writeln!(
                    output,
                    "Lowest latency:   {} ({}) = {}ms",
                    self.colorize(&low.label(), self.color_scheme.highlight),
                    low.region,
                    self.latency(low.avg_ms)
                )
                .map_err(&err)?;
                writeln!(
                    output,
                    "Highest latency:  {} ({}) = {}ms",
                    self.colorize(&high.label(), self.color_scheme.highlight),
                    high.region,
                    self.latency(high.avg_ms)
                )
                .map_err(&err)?;
                write!(output, "Average latency across all AZ pairs: {}ms", self.latency(mean)).map_err(&err)?;
            }
            _ => write!(
                output,
                "{}",
                self.colorize("No measurement results found.", self.color_scheme.warning)
            )
            .map_err(&err)?,
        }

        Ok(output)
    }

    fn format_region_table(&self, region: &RegionSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("region table");

        writeln!(output, "{}", self.title(&region.region)).map_err(&err)?;
        if region.pairs.is_empty() {
            write!(
                output,
                "{}",
                self.colorize("No successful measurements.", self.color_scheme.muted)
            )
            .map_err(&err)?;
        } else {
            let averages: Vec<f64> = region.pairs.iter().map(|p| p.avg_ms).collect();
            let table = self.latency_table(
                self.plain.pair_columns(),
                self.plain.pair_rows(&region.pairs),
                &averages,
                &[3],
            )?;
            write!(output, "{}", table).map_err(&err)?;
        }
        if region.error_count > 0 {
            let note = format!("{} measurement(s) failed", region.error_count);
            write!(output, "\n{}", self.colorize(&note, self.color_scheme.error)).map_err(&err)?;
        }

        Ok(output)
    }

    fn format_rankings(&self, summary: &RunSummary, n: usize) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("rankings");

        writeln!(output, "{}", self.title(&format!("Top {} Lowest Latency AZ Pairs", n))).map_err(&err)?;
        writeln!(output, "{}", self.ranking(&summary.lowest(n))?).map_err(&err)?;
        writeln!(output).map_err(&err)?;
        writeln!(output, "{}", self.title(&format!("Top {} Highest Latency AZ Pairs", n))).map_err(&err)?;
        write!(output, "{}", self.ranking(&summary.highest(n))?).map_err(&err)?;

        Ok(output)
    }

    fn format_region_overview(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("region overview");

        let averages: Vec<f64> = summary
            .regions
            .iter()
            .map(|r| r.mean_avg_ms().unwrap_or(f64::NAN))
            .collect();
        let table = self.latency_table(
            self.plain.region_overview_columns(),
            self.plain.region_overview_rows(summary),
            &averages,
            &[3],
        )?;

        writeln!(output, "{}", self.title("Per-Region Latency Summary")).map_err(&err)?;
        write!(output, "{}", table).map_err(&err)?;

        Ok(output)
    }

    fn format_errors(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("errors");

        writeln!(output, "{}", self.title("Errors")).map_err(&err)?;
        if summary.errors.is_empty() {
            write!(output, "{}", self.colorize("None.", self.color_scheme.success)).map_err(&err)?;
            return Ok(output);
        }

        let by_kind: Vec<String> = summary
            .errors_by_kind
            .iter()
            .map(|(kind, count)| {
                format!("{}: {}", self.colorize(kind.as_str(), self.color_scheme.error_kind(*kind)), count)
            })
            .collect();
        writeln!(output, "{}", by_kind.join(", ")).map_err(&err)?;

        let format = TableFormat::new(self.plain.error_columns(), self.options.table_borders);
        let styler = |row: usize, col: usize, cell: &str| -> String {
            match summary.errors.get(row) {
                Some(entry) if col == 3 => self
                    .colorize(cell, self.color_scheme.error_kind(entry.error_kind))
                    .to_string(),
                _ => cell.to_string(),
            }
        };
        let table = self
            .plain
            .create_styled_table(&format, &self.plain.error_rows(summary), Some(&styler))?;
        write!(output, "{}", table).map_err(&err)?;

        Ok(output)
    }

    fn format_methodology(&self, summary: &RunSummary) -> Result<String> {
        self.plain.format_methodology(summary)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("ERROR:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("WARNING:", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("OK:", self.color_scheme.success), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_colors() {
        assert_eq!(latency_color(LatencyLevel::Good), Color::Green);
        assert_eq!(latency_color(LatencyLevel::Moderate), Color::Yellow);
        assert_eq!(latency_color(LatencyLevel::Poor), Color::Red);
    }

    #[test]
    fn test_disabled_color_matches_plain_text() {
        let formatter = ColoredFormatter::new(FormattingOptions {
            enable_color: false,
            ..Default::default()
        });
        assert_eq!(formatter.format_error("boom").unwrap(), "ERROR: boom");
        assert_eq!(formatter.format_header("Report").unwrap(), "==========\n  Report\n==========");
    }
}
