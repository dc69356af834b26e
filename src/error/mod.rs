//! Error handling for the latency mesh orchestrator
//!
//! Only structural problems (bad inventory, bad configuration, unwritable
//! output) surface as [`AppError`]. Individual probe failures are recorded as
//! `error` measurements and never abort a run.

use thiserror::Error;

/// Custom error types for the latency mesh orchestrator
#[derive(Error, Debug)]
pub enum AppError {
    /// Inventory data is missing required fields or violates uniqueness rules
    #[error("Malformed inventory: {0}")]
    MalformedInventory(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (file operations, subprocess spawning)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (JSON, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Remote command channel errors
    #[error("Remote channel error: {0}")]
    Remote(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new malformed inventory error
    pub fn malformed_inventory<S: Into<String>>(message: S) -> Self {
        Self::MalformedInventory(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new remote channel error
    pub fn remote<S: Into<String>>(message: S) -> Self {
        Self::Remote(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedInventory(_) => "INVENTORY",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Remote(_) => "REMOTE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::MalformedInventory(_) => 2,
            Self::Remote(_) => 3,
            Self::Timeout(_) => 4,
            Self::Io(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::MalformedInventory(_) | Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Remote(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, keeping its category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::MalformedInventory(msg) => AppError::MalformedInventory(format!("{}: {}", context, msg)),
                AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
                AppError::Io(msg) => AppError::Io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::Parse(format!("{}: {}", context, msg)),
                AppError::Remote(msg) => AppError::Remote(format!("{}: {}", context, msg)),
                AppError::Timeout(msg) => AppError::Timeout(format!("{}: {}", context, msg)),
                AppError::Internal(msg) => AppError::Internal(format!("{}: {}", context, msg)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let inventory_error = AppError::malformed_inventory("missing region");
        assert_eq!(inventory_error.category(), "INVENTORY");
        assert_eq!(inventory_error.exit_code(), 2);

        let remote_error = AppError::remote("connection refused");
        assert_eq!(remote_error.category(), "REMOTE");
        assert_eq!(remote_error.exit_code(), 3);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::malformed_inventory("node 'x' has no az_id");
        let display = error.to_string();
        assert!(display.contains("Malformed inventory"));
        assert!(display.contains("node 'x' has no az_id"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::malformed_inventory("inventory"),
            AppError::config("config"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::remote("remote"),
            AppError::timeout("timeout"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "INVENTORY", "CONFIG", "IO", "PARSE", "REMOTE", "TIMEOUT", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::malformed_inventory("test").exit_code(), 2);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::timeout("test").exit_code(), 4);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let json_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let app_error: AppError = json_error.into();
        assert_eq!(app_error.category(), "PARSE");
        assert!(app_error.to_string().contains("JSON parse error"));
    }

    #[test]
    fn test_with_context_keeps_category() {
        let result: Result<()> = Err(AppError::malformed_inventory("duplicate az_id"));
        let error = result.with_context(|| "region us-east-1".to_string()).unwrap_err();
        assert_eq!(error.category(), "INVENTORY");
        assert!(error.to_string().contains("region us-east-1: duplicate az_id"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::config("Test error");
        let plain = error.format_for_console(false);
        let colored = error.format_for_console(true);

        assert!(plain.contains("[CONFIG]"));
        assert!(colored.contains("CONFIG"));
        assert!(colored.contains("Test error"));
    }
}
