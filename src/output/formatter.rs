//! Report formatting trait and the plain-text implementation
//!
//! Tables are laid out by [`PlainFormatter::create_table`]; the colored
//! formatter reuses that layout and only styles already padded cells.

use crate::{
    error::{AppError, Result},
    stats::{PairLatency, RegionSummary, RunSummary},
};
use std::fmt::Write as _;

/// One renderer per report section
pub trait OutputFormatter {
    fn format_header(&self, title: &str) -> Result<String>;

    /// Counts and run metadata
    fn format_run_overview(&self, summary: &RunSummary) -> Result<String>;

    /// Lowest and highest pair, mean of all pair averages
    fn format_key_findings(&self, summary: &RunSummary) -> Result<String>;

    /// One region's pairs, ascending by average latency
    fn format_region_table(&self, region: &RegionSummary) -> Result<String>;

    /// Top-`n` lowest and highest pairs across all regions
    fn format_rankings(&self, summary: &RunSummary, n: usize) -> Result<String>;

    /// Pair count and min/mean/max of averages per region
    fn format_region_overview(&self, summary: &RunSummary) -> Result<String>;

    fn format_errors(&self, summary: &RunSummary) -> Result<String>;

    fn format_methodology(&self, summary: &RunSummary) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Include error details in listings
    pub verbose_mode: bool,
    pub table_borders: bool,
    pub max_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            max_width: 120,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
    pub min_column_width: usize,
    pub max_column_width: usize,
}

impl TableFormat {
    pub fn new(columns: Vec<Column>, show_borders: bool) -> Self {
        Self {
            columns,
            show_borders,
            show_header: true,
            min_column_width: 4,
            max_column_width: 60,
        }
    }
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            min_width: 4,
            max_width: 60,
        }
    }

    pub fn right(header: &str) -> Self {
        Self {
            alignment: Alignment::Right,
            ..Self::left(header)
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Styles a padded cell given its data-row and column index
pub(crate) type CellStyler<'a> = &'a dyn Fn(usize, usize, &str) -> String;

pub(crate) fn fmt_err(section: &str) -> impl Fn(std::fmt::Error) -> AppError + '_ {
    move |e| AppError::internal(format!("Failed to format {}: {}", section, e))
}

/// Latency in milliseconds with fixed precision
pub fn format_ms(value: f64) -> String {
    format!("{:.3}", value)
}

pub fn format_optional_ms(value: Option<f64>) -> String {
    value.map(format_ms).unwrap_or_else(|| "-".to_string())
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    pub(crate) fn pair_columns(&self) -> Vec<Column> {
        vec![
            Column::left("Source AZ"),
            Column::left("Target AZ"),
            Column::right("Min (ms)"),
            Column::right("Avg (ms)"),
            Column::right("Max (ms)"),
            Column::right("Mdev (ms)"),
            Column::right("Loss %"),
        ]
    }

    pub(crate) fn pair_rows(&self, pairs: &[PairLatency]) -> Vec<RowData> {
        pairs
            .iter()
            .map(|p| {
                vec![
                    p.source_az.clone(),
                    p.target_az.clone(),
                    format_ms(p.min_ms),
                    format_ms(p.avg_ms),
                    format_ms(p.max_ms),
                    format_ms(p.mdev_ms),
                    format!("{:.1}", p.packet_loss_pct),
                ]
            })
            .collect()
    }

    pub(crate) fn ranking_columns(&self) -> Vec<Column> {
        vec![
            Column::left("Region"),
            Column::left("Source AZ"),
            Column::left("Target AZ"),
            Column::right("Avg (ms)"),
        ]
    }

    pub(crate) fn ranking_rows(&self, pairs: &[&PairLatency]) -> Vec<RowData> {
        pairs
            .iter()
            .map(|p| vec![p.region.clone(), p.source_az.clone(), p.target_az.clone(), format_ms(p.avg_ms)])
            .collect()
    }

    pub(crate) fn region_overview_rows(&self, summary: &RunSummary) -> Vec<RowData> {
        summary
            .regions
            .iter()
            .map(|r| {
                vec![
                    r.region.clone(),
                    r.measured_pairs().to_string(),
                    format_optional_ms(r.min_avg_ms()),
                    format_optional_ms(r.mean_avg_ms()),
                    format_optional_ms(r.max_avg_ms()),
                    r.error_count.to_string(),
                ]
            })
            .collect()
    }

    pub(crate) fn region_overview_columns(&self) -> Vec<Column> {
        vec![
            Column::left("Region"),
            Column::right("AZ Pairs"),
            Column::right("Min (ms)"),
            Column::right("Mean (ms)"),
            Column::right("Max (ms)"),
            Column::right("Errors"),
        ]
    }

    pub(crate) fn error_rows(&self, summary: &RunSummary) -> Vec<RowData> {
        summary
            .errors
            .iter()
            .map(|e| {
                let mut row = vec![
                    e.region.clone(),
                    e.source_az.clone(),
                    e.target_az.clone(),
                    e.error_kind.to_string(),
                ];
                if self.options.verbose_mode {
                    row.push(e.detail.clone().unwrap_or_default().replace('\n', " "));
                }
                row
            })
            .collect()
    }

    pub(crate) fn error_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::left("Region"),
            Column::left("Source AZ"),
            Column::left("Target AZ"),
            Column::left("Error"),
        ];
        if self.options.verbose_mode {
            columns.push(Column::left("Detail"));
        }
        columns
    }

    /// Lay out `rows` under `format`
    pub fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        self.create_styled_table(format, rows, None)
    }

    pub(crate) fn create_styled_table(
        &self,
        format: &TableFormat,
        rows: &[RowData],
        styler: Option<CellStyler<'_>>,
    ) -> Result<String> {
        if rows.is_empty() {
            return Ok(String::new());
        }

        let widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();
        let err = fmt_err("table");

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                writeln!(output, "{}", self.create_horizontal_border(&widths)).map_err(&err)?;
            }
            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            writeln!(output, "{}", self.create_row(&headers, &widths, format, None)).map_err(&err)?;
            if format.show_borders {
                writeln!(output, "{}", self.create_horizontal_border(&widths)).map_err(&err)?;
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            let style = styler.map(|s| (row_idx, s));
            writeln!(output, "{}", self.create_row(row, &widths, format, style)).map_err(&err)?;
        }

        if format.show_borders {
            write!(output, "{}", self.create_horizontal_border(&widths)).map_err(&err)?;
        }

        Ok(output)
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let num_columns = format
            .columns
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..num_columns)
            .map(|col_idx| {
                let column = format.columns.get(col_idx);
                let floor = column
                    .map(|c| c.min_width.max(c.header.chars().count()))
                    .unwrap_or(format.min_column_width);
                let ceiling = column.map(|c| c.max_width).unwrap_or(format.max_column_width);

                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col_idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);

                floor.max(content).min(ceiling)
            })
            .collect()
    }

    fn create_row(
        &self,
        data: &[String],
        widths: &[usize],
        format: &TableFormat,
        style: Option<(usize, CellStyler<'_>)>,
    ) -> String {
        let mut row = String::new();
        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format.columns.get(idx).map(|c| c.alignment).unwrap_or(Alignment::Left);
            let padded = self.align_text(cell, width, alignment);
            let rendered = match style {
                Some((row_idx, styler)) => styler(row_idx, idx, &padded),
                None => padded,
            };

            if format.show_borders {
                row.push(' ');
                row.push_str(&rendered);
                row.push_str(" |");
            } else {
                row.push_str(&rendered);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        if widths.is_empty() {
            return String::new();
        }
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn align_text(&self, text: &str, width: usize, alignment: Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        }
    }

    fn section_title(&self, title: &str) -> String {
        format!("{}\n{}", title, "-".repeat(title.chars().count()))
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);
        let err = fmt_err("header");

        writeln!(output, "{}", border).map_err(&err)?;
        writeln!(output, "  {}", title).map_err(&err)?;
        write!(output, "{}", border).map_err(&err)?;

        Ok(output)
    }

    fn format_run_overview(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("run overview");

        writeln!(output, "{}", self.section_title("Measurement Summary")).map_err(&err)?;
        writeln!(output, "Started:                 {}", summary.started_at.to_rfc3339()).map_err(&err)?;
        if let Some(finished) = summary.finished_at {
            writeln!(output, "Finished:                {}", finished.to_rfc3339()).map_err(&err)?;
        }
        if !summary.clouds.is_empty() {
            writeln!(output, "Clouds:                  {}", summary.clouds.join(", ")).map_err(&err)?;
        }
        writeln!(output, "Regions covered:         {}", summary.regions.len()).map_err(&err)?;
        writeln!(output, "Probes per measurement:  {}", summary.probe_count).map_err(&err)?;
        writeln!(output, "Total measurements:      {}", summary.total_measurements).map_err(&err)?;
        writeln!(output, "Results:                 {}", summary.total_results).map_err(&err)?;
        writeln!(output, "Errors:                  {}", summary.total_errors).map_err(&err)?;
        write!(output, "Skipped:                 {}", summary.total_skips).map_err(&err)?;

        Ok(output)
    }

    fn format_key_findings(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("key findings");

        writeln!(output, "{}", self.section_title("Key Findings")).map_err(&err)?;
        match (summary.fastest(), summary.slowest(), summary.overall_mean_ms()) {
            (Some(low), Some(high), Some(mean)) => {
                writeln!(output, "Lowest latency:   {} ({}) = {}ms", low.label(), low.region, format_ms(low.avg_ms))
                    .map_err(&err)?;
                writeln!(output, "Highest latency:  {} ({}) = {}ms", high.label(), high.region, format_ms(high.avg_ms))
                    .map_err(&err)?;
                write!(output, "Average latency across all AZ pairs: {}ms", format_ms(mean)).map_err(&err)?;
            }
            _ => write!(output, "No measurement results found.").map_err(&err)?,
        }

        Ok(output)
    }

    fn format_region_table(&self, region: &RegionSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("region table");

        writeln!(output, "{}", self.section_title(&region.region)).map_err(&err)?;
        if region.pairs.is_empty() {
            write!(output, "No successful measurements.").map_err(&err)?;
        } else {
            let format = TableFormat::new(self.pair_columns(), self.options.table_borders);
            write!(output, "{}", self.create_table(&format, &self.pair_rows(&region.pairs))?).map_err(&err)?;
        }
        if region.error_count > 0 {
            write!(output, "\n{} measurement(s) failed", region.error_count).map_err(&err)?;
        }

        Ok(output)
    }

    fn format_rankings(&self, summary: &RunSummary, n: usize) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("rankings");
        let format = TableFormat::new(self.ranking_columns(), self.options.table_borders);

        writeln!(output, "{}", self.section_title(&format!("Top {} Lowest Latency AZ Pairs", n))).map_err(&err)?;
        writeln!(output, "{}", self.create_table(&format, &self.ranking_rows(&summary.lowest(n)))?).map_err(&err)?;
        writeln!(output).map_err(&err)?;
        writeln!(output, "{}", self.section_title(&format!("Top {} Highest Latency AZ Pairs", n))).map_err(&err)?;
        write!(output, "{}", self.create_table(&format, &self.ranking_rows(&summary.highest(n)))?).map_err(&err)?;

        Ok(output)
    }

    fn format_region_overview(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("region overview");
        let format = TableFormat::new(self.region_overview_columns(), self.options.table_borders);

        writeln!(output, "{}", self.section_title("Per-Region Latency Summary")).map_err(&err)?;
        write!(output, "{}", self.create_table(&format, &self.region_overview_rows(summary))?).map_err(&err)?;

        Ok(output)
    }

    fn format_errors(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("errors");

        writeln!(output, "{}", self.section_title("Errors")).map_err(&err)?;
        if summary.errors.is_empty() {
            write!(output, "None.").map_err(&err)?;
            return Ok(output);
        }

        let by_kind: Vec<String> = summary
            .errors_by_kind
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        writeln!(output, "{}", by_kind.join(", ")).map_err(&err)?;

        let format = TableFormat::new(self.error_columns(), self.options.table_borders);
        write!(output, "{}", self.create_table(&format, &self.error_rows(summary))?).map_err(&err)?;

        Ok(output)
    }

    fn format_methodology(&self, summary: &RunSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("methodology");

        writeln!(output, "{}", self.section_title("Methodology")).map_err(&err)?;
        writeln!(output, "Tool: ICMP ping, {} packets per measurement", summary.probe_count).map_err(&err)?;
        writeln!(output, "Metric: round-trip time in milliseconds (min/avg/max/mdev as reported by ping)")
            .map_err(&err)?;
        writeln!(output, "One probe node per availability zone; targets are private addresses in the same region")
            .map_err(&err)?;
        writeln!(output, "Full mesh: every unordered AZ pair measured once, from the AZ with the smaller id")
            .map_err(&err)?;
        write!(
            output,
            "Generated by {} {} (commit {}, built {})",
            crate::PKG_NAME,
            crate::VERSION,
            env!("GIT_COMMIT"),
            env!("BUILD_TIME")
        )
        .map_err(&err)?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("OK: {}", message))
    }
}
