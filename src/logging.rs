//! Structured logging for the latency mesh orchestrator
//!
//! Three output shapes share one entry model:
//! - compact progress lines for normal runs
//! - console lines with structured fields for `--verbose`
//! - JSON lines with source locations for `--debug`
//!
//! Logging only observes; nothing here feeds back into measurements.

use crate::error::{AppError, Result};
use crate::models::{Config, Measurement, Run};
use crate::types::MeasurementKind;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn paint(&self, text: &str) -> ColoredString {
        match self {
            LogLevel::Debug => text.cyan(),
            LogLevel::Info => text.green(),
            LogLevel::Warn => text.yellow(),
            LogLevel::Error => text.red(),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component name
    pub logger: String,
    /// Groups the entries of one region sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LogLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Timestamped lines with structured fields
    Console,
    /// One JSON object per line
    Json,
    /// Short progress lines
    Compact,
}

#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: BTreeMap<String, serde_json::Value>,
}

/// Where formatted lines go
#[derive(Debug, Clone, Default)]
enum LogSink {
    /// stdout, or stderr for warnings and above
    #[default]
    Standard,
    /// In-memory buffer, for asserting on output
    Capture(Arc<Mutex<Vec<String>>>),
}

/// Logger with shared session context; clones share that context
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
    sink: LogSink,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name: name.into(),
            context: Arc::new(RwLock::new(LogContext::default())),
            sink: LogSink::Standard,
        }
    }

    /// Level and format follow the `debug`/`verbose` switches
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        let (min_level, format) = if config.debug {
            (LogLevel::Debug, LogFormat::Json)
        } else if config.verbose {
            (LogLevel::Info, LogFormat::Console)
        } else {
            (LogLevel::Info, LogFormat::Compact)
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format,
            name: name.into(),
            context: Arc::new(RwLock::new(LogContext::default())),
            sink: LogSink::Standard,
        }
    }

    /// Same settings and context, different component name
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Redirect output into a shared buffer and return it
    pub fn capture(&mut self) -> Arc<Mutex<Vec<String>>> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        self.sink = LogSink::Capture(buffer.clone());
        buffer
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    pub async fn set_session_id(&self, session_id: String) {
        self.context.write().await.session_id = Some(session_id);
    }

    /// Attach a field to every subsequent entry
    pub async fn add_context_field<T: Serialize>(&self, key: &str, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.context.write().await.context_fields.insert(key.to_string(), json_value);
        }
    }

    /// Open a correlated operation; entries logged until it ends carry its id
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        self.context.write().await.current_correlation_id = Some(correlation_id.clone());

        self.debug(&format!("Started {}", operation_name))
            .field("operation", operation_name)
            .log()
            .await;

        correlation_id
    }

    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str) {
        self.debug(&format!("Finished {}", operation_name))
            .field("operation", operation_name)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        {
            let context = self.context.read().await;
            if let Some(session_id) = &context.session_id {
                entry
                    .fields
                    .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
            }
            if entry.correlation_id.is_none() {
                entry.correlation_id = context.current_correlation_id.clone();
            }
            for (key, value) in &context.context_fields {
                entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        if !self.include_location {
            entry.location = None;
        }

        let line = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
            LogFormat::Compact => self.format_compact(&entry),
        };

        match &self.sink {
            LogSink::Standard if entry.level >= LogLevel::Warn => {
                let _ = writeln!(io::stderr(), "{}", line);
            }
            LogSink::Standard => {
                let _ = writeln!(io::stdout(), "{}", line);
            }
            LogSink::Capture(buffer) => {
                if let Ok(mut lines) = buffer.lock() {
                    lines.push(line);
                }
            }
        }
    }

    fn level_label(&self, level: LogLevel, width: usize) -> String {
        let label = format!("{:>width$}", level.as_str(), width = width);
        if self.use_color {
            level.paint(&label).to_string()
        } else {
            label
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let mut output = format!(
            "{} {} [{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level_label(entry.level, 5),
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            output.push_str(&format!(" [{}]", correlation_id.get(..8).unwrap_or(correlation_id)));
        }

        let fields: Vec<String> = entry
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != "session_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !fields.is_empty() {
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if let Some(location) = &entry.location {
            output.push_str(&format!(" @ {}:{}", location.file, location.line));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|_| {
            serde_json::json!({ "error": "unserializable log entry", "message": entry.message }).to_string()
        })
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let level = if entry.level == LogLevel::Info {
            String::new()
        } else {
            format!("{} ", self.level_label(entry.level, 0))
        };
        format!("{} {}{}", entry.timestamp.format("%H:%M:%S"), level, entry.message)
    }
}

/// Builder for one entry: `logger.info(msg).field(k, v).log().await`
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Progress reporting for region sweeps and individual probes
#[derive(Debug, Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn region_started(&self, region: &str, node_count: usize, pair_count: usize) -> String {
        let correlation_id = self.logger.start_operation(&format!("region {}", region)).await;
        self.logger
            .info(&format!("[{}] {} AZs, running {} measurements", region, node_count, pair_count))
            .field("region", region)
            .field("nodes", node_count)
            .field("pairs", pair_count)
            .log()
            .await;
        correlation_id
    }

    pub async fn region_skipped(&self, region: &str) {
        self.logger
            .info(&format!("[{}] fewer than 2 AZs, nothing to measure", region))
            .field("region", region)
            .log()
            .await;
    }

    /// One line per terminal measurement, in completion order
    pub async fn probe_completed(&self, measurement: &Measurement) {
        let route = format!("{} -> {}", measurement.source_az(), measurement.target_az());
        match measurement {
            Measurement::Result(r) => {
                self.logger
                    .info(&format!("  {}: {:.3}ms", route, r.avg_ms))
                    .field("region", &r.region)
                    .field("source_az", &r.source_az)
                    .field("target_az", &r.target_az)
                    .field("avg_ms", r.avg_ms)
                    .field("packet_loss_pct", r.packet_loss_pct)
                    .log()
                    .await;
            }
            Measurement::Skip(s) => {
                self.logger
                    .debug(&format!("  {}: skipped ({})", route, s.reason))
                    .field("region", &s.region)
                    .field("reason", &s.reason)
                    .log()
                    .await;
            }
            Measurement::Error(e) => {
                let mut builder = self
                    .logger
                    .warn(&format!("  {}: ERROR - {}", route, e.error_kind))
                    .field("region", &e.region)
                    .field("source_az", &e.source_az)
                    .field("target_az", &e.target_az)
                    .field("error_kind", e.error_kind);
                if let Some(detail) = &e.detail {
                    builder = builder.field("detail", detail);
                }
                builder.log().await;
            }
        }
    }

    pub async fn region_finished(&self, correlation_id: &str, region: &str, elapsed: Duration) {
        self.logger
            .debug(&format!("[{}] finished in {:.1}s", region, elapsed.as_secs_f64()))
            .field("region", region)
            .field("elapsed_ms", elapsed.as_millis() as u64)
            .log()
            .await;
        self.logger.end_operation(correlation_id, &format!("region {}", region)).await;
    }

    pub async fn checkpoint(&self, outcome: &Result<PathBuf>, measurements: usize) {
        match outcome {
            Ok(path) => {
                self.logger
                    .debug(&format!("Checkpoint written to {}", path.display()))
                    .field("path", path.display().to_string())
                    .field("measurements", measurements)
                    .log()
                    .await
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Checkpoint failed: {}", e))
                    .field("measurements", measurements)
                    .error_info(e)
                    .log()
                    .await
            }
        }
    }

    pub async fn cancelled(&self, reason: &str) {
        self.logger
            .warn(&format!("Run cancelled: {}", reason))
            .field("reason", reason)
            .log()
            .await;
    }

    pub async fn run_summary(&self, run: &Run) {
        self.logger
            .info(&format!(
                "Total measurements: {}, errors: {}, skipped: {}",
                run.measurements.len(),
                run.count(MeasurementKind::Error),
                run.count(MeasurementKind::Skip)
            ))
            .field("results", run.count(MeasurementKind::Result))
            .field("errors", run.count(MeasurementKind::Error))
            .field("skips", run.count(MeasurementKind::Skip))
            .field("regions", &run.regions)
            .log()
            .await;
    }
}

/// Hands out loggers that share one session id
pub struct LoggerFactory {
    base: Logger,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: &Config) -> Self {
        Self::from_logger(Logger::with_config("MAIN", config))
    }

    /// Build on an existing logger (its sink and format are inherited)
    pub fn from_logger(base: Logger) -> Self {
        Self {
            base,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = self.base.named(name);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::new(self.create_logger("PROBE").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Debug entry tagged with its source location
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}
