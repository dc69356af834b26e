//! Type definitions and aliases

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Terminal outcome classes of a single probe task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Latency statistics were collected
    Result,
    /// The pair was not probed (source and target share an AZ)
    Skip,
    /// The probe failed, timed out, produced unparseable output or was cancelled
    Error,
}

impl MeasurementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Result => "result",
            Self::Skip => "skip",
            Self::Error => "error",
        }
    }
}

/// Why a probe produced an `error` measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// Channel could not be established or the remote command exited non-zero
    ProbeFailed,
    /// Channel setup or command execution exceeded the per-probe timeout
    Timeout,
    /// The echo-train summary line was absent or malformed
    ParseFailed,
    /// The run was cancelled before or while this probe ran
    Cancelled,
}

impl ProbeErrorKind {
    /// Wire name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProbeFailed => "probe_failed",
            Self::Timeout => "timeout",
            Self::ParseFailed => "parse_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of an intra-region round-trip time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatencyLevel {
    /// Under 1 ms
    Good,
    /// 1 to 2 ms
    Moderate,
    /// 2 ms and above
    Poor,
}

impl LatencyLevel {
    pub fn from_ms(avg_ms: f64) -> Self {
        if avg_ms < 1.0 {
            Self::Good
        } else if avg_ms < 2.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_wire_names_match_serde() {
        for kind in [
            ProbeErrorKind::ProbeFailed,
            ProbeErrorKind::Timeout,
            ProbeErrorKind::ParseFailed,
            ProbeErrorKind::Cancelled,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_latency_levels() {
        assert_eq!(LatencyLevel::from_ms(0.4), LatencyLevel::Good);
        assert_eq!(LatencyLevel::from_ms(1.0), LatencyLevel::Moderate);
        assert_eq!(LatencyLevel::from_ms(2.5), LatencyLevel::Poor);
    }
}
