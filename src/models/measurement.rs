//! Measurement records produced by probe tasks

use crate::models::node::Pair;
use crate::types::{MeasurementKind, ProbeErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latency statistics parsed from one echo-train summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeStats {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub mdev_ms: f64,
    pub packet_loss_pct: f64,
}

/// Successful probe outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    pub source_az: String,
    pub target_az: String,
    pub source_address: String,
    pub target_address: String,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub mdev_ms: f64,
    pub packet_loss_pct: f64,
    pub probe_count: u32,
    pub timestamp: DateTime<Utc>,
}

/// A pair that was deliberately not probed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRecord {
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    pub source_az: String,
    pub target_az: String,
    pub reason: String,
}

/// A probe that produced no statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeFailure {
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    pub source_az: String,
    pub target_az: String,
    pub error_kind: ProbeErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One immutable probe outcome, tagged by kind in its serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measurement {
    Result(ProbeResult),
    Skip(SkipRecord),
    Error(ProbeFailure),
}

impl Measurement {
    /// Build a `result` measurement stamped with the current UTC time
    pub fn result(pair: &Pair, stats: ProbeStats, probe_count: u32) -> Self {
        Self::Result(ProbeResult {
            region: pair.region.clone(),
            cloud: pair.source.cloud.clone(),
            source_az: pair.source.az_id.clone(),
            target_az: pair.target.az_id.clone(),
            source_address: pair.source.public_address.clone().unwrap_or_default(),
            target_address: pair.target.private_address.clone(),
            min_ms: stats.min_ms,
            avg_ms: stats.avg_ms,
            max_ms: stats.max_ms,
            mdev_ms: stats.mdev_ms,
            packet_loss_pct: stats.packet_loss_pct,
            probe_count,
            timestamp: Utc::now(),
        })
    }

    pub fn skip(pair: &Pair, reason: impl Into<String>) -> Self {
        Self::Skip(SkipRecord {
            region: pair.region.clone(),
            cloud: pair.source.cloud.clone(),
            source_az: pair.source.az_id.clone(),
            target_az: pair.target.az_id.clone(),
            reason: reason.into(),
        })
    }

    pub fn error(pair: &Pair, error_kind: ProbeErrorKind, detail: Option<String>) -> Self {
        Self::Error(ProbeFailure {
            region: pair.region.clone(),
            cloud: pair.source.cloud.clone(),
            source_az: pair.source.az_id.clone(),
            target_az: pair.target.az_id.clone(),
            error_kind,
            detail,
        })
    }

    pub fn cancelled(pair: &Pair, detail: impl Into<String>) -> Self {
        Self::error(pair, ProbeErrorKind::Cancelled, Some(detail.into()))
    }

    pub fn kind(&self) -> MeasurementKind {
        match self {
            Self::Result(_) => MeasurementKind::Result,
            Self::Skip(_) => MeasurementKind::Skip,
            Self::Error(_) => MeasurementKind::Error,
        }
    }

    pub fn region(&self) -> &str {
        match self {
            Self::Result(r) => &r.region,
            Self::Skip(s) => &s.region,
            Self::Error(e) => &e.region,
        }
    }

    pub fn source_az(&self) -> &str {
        match self {
            Self::Result(r) => &r.source_az,
            Self::Skip(s) => &s.source_az,
            Self::Error(e) => &e.source_az,
        }
    }

    pub fn target_az(&self) -> &str {
        match self {
            Self::Result(r) => &r.target_az,
            Self::Skip(s) => &s.target_az,
            Self::Error(e) => &e.target_az,
        }
    }

    /// Average round-trip time, present only on `result` measurements
    pub fn avg_ms(&self) -> Option<f64> {
        match self {
            Self::Result(r) => Some(r.avg_ms),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ProbeErrorKind> {
        match self {
            Self::Error(e) => Some(e.error_kind),
            _ => None,
        }
    }

    pub fn as_result(&self) -> Option<&ProbeResult> {
        match self {
            Self::Result(r) => Some(r),
            _ => None,
        }
    }
}
