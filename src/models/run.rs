//! Run aggregate: the authoritative, round-trippable record of one campaign

use crate::error::Result;
use crate::models::measurement::Measurement;
use crate::types::MeasurementKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level record of one measurement campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    pub probe_count_per_measurement: u32,

    pub regions: Vec<String>,

    #[serde(default)]
    pub clouds: Vec<String>,

    /// Appended in completion order; never mutated once recorded
    pub measurements: Vec<Measurement>,
}

impl Run {
    pub fn new(probe_count_per_measurement: u32, regions: Vec<String>, clouds: Vec<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            probe_count_per_measurement,
            regions,
            clouds,
            measurements: Vec::new(),
        }
    }

    pub fn record(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn finalize(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn count(&self, kind: MeasurementKind) -> usize {
        self.measurements.iter().filter(|m| m.kind() == kind).count()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::measurement::ProbeStats;
    use crate::models::node::{fixtures::node, Pair};
    use crate::types::ProbeErrorKind;

    fn sample_run() -> Run {
        let mut run = Run::new(100, vec!["eu-west-1".to_string()], vec!["aws".to_string()]);
        let ab = Pair::new("eu-west-1", node("eu-west-1", "euw1-az1"), node("eu-west-1", "euw1-az2"));
        let ac = Pair::new("eu-west-1", node("eu-west-1", "euw1-az1"), node("eu-west-1", "euw1-az3"));
        run.record(Measurement::result(
            &ab,
            ProbeStats {
                min_ms: 0.1 + 0.2,
                avg_ms: 1.0 / 3.0,
                max_ms: 0.789,
                mdev_ms: 0.012,
                packet_loss_pct: 1.0,
            },
            100,
        ));
        run.record(Measurement::error(&ac, ProbeErrorKind::Timeout, None));
        run.finalize();
        run
    }

    #[test]
    fn test_round_trip_is_identical() {
        let run = sample_run();
        let json = run.to_json_pretty().unwrap();
        let loaded = Run::from_json(&json).unwrap();
        assert_eq!(loaded, run);

        let again = Run::from_json(&loaded.to_json_pretty().unwrap()).unwrap();
        assert_eq!(again, run);
    }

    #[test]
    fn test_counts_by_kind() {
        let run = sample_run();
        assert_eq!(run.count(MeasurementKind::Result), 1);
        assert_eq!(run.count(MeasurementKind::Error), 1);
        assert_eq!(run.count(MeasurementKind::Skip), 0);
        assert!(run.is_finalized());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Run::from_json("{\"started_at\": 5}").is_err());
    }
}
