//! Run aggregation
//!
//! Each pair is probed once per run, so per-pair latency figures are taken as
//! reported by the probe. Aggregation only counts outcomes, groups them by
//! region and orders pairs by average round-trip time.

use crate::{
    models::{Measurement, ProbeResult, Run},
    types::{LatencyLevel, MeasurementKind, ProbeErrorKind},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Latency of one probed pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLatency {
    pub region: String,
    pub cloud: Option<String>,
    pub source_az: String,
    pub target_az: String,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub mdev_ms: f64,
    pub packet_loss_pct: f64,
}

impl PairLatency {
    pub fn label(&self) -> String {
        format!("{}<->{}", self.source_az, self.target_az)
    }

    pub fn level(&self) -> LatencyLevel {
        LatencyLevel::from_ms(self.avg_ms)
    }
}

impl From<&ProbeResult> for PairLatency {
    fn from(r: &ProbeResult) -> Self {
        Self {
            region: r.region.clone(),
            cloud: r.cloud.clone(),
            source_az: r.source_az.clone(),
            target_az: r.target_az.clone(),
            min_ms: r.min_ms,
            avg_ms: r.avg_ms,
            max_ms: r.max_ms,
            mdev_ms: r.mdev_ms,
            packet_loss_pct: r.packet_loss_pct,
        }
    }
}

/// Failed probe as listed in reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub region: String,
    pub source_az: String,
    pub target_az: String,
    pub error_kind: ProbeErrorKind,
    pub detail: Option<String>,
}

/// Per-region view, pairs ascending by `avg_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub cloud: Option<String>,
    pub pairs: Vec<PairLatency>,
    pub error_count: usize,
    pub skip_count: usize,
}

impl RegionSummary {
    fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            cloud: None,
            pairs: Vec::new(),
            error_count: 0,
            skip_count: 0,
        }
    }

    pub fn measured_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Lowest pair average
    pub fn min_avg_ms(&self) -> Option<f64> {
        self.pairs.first().map(|p| p.avg_ms)
    }

    /// Highest pair average
    pub fn max_avg_ms(&self) -> Option<f64> {
        self.pairs.last().map(|p| p.avg_ms)
    }

    /// Mean of the pair averages
    pub fn mean_avg_ms(&self) -> Option<f64> {
        mean(self.pairs.iter().map(|p| p.avg_ms))
    }
}

/// Totals and groupings derived from one [`Run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub probe_count: u32,
    pub clouds: Vec<String>,
    pub total_measurements: usize,
    pub total_results: usize,
    pub total_errors: usize,
    pub total_skips: usize,
    pub errors_by_kind: BTreeMap<ProbeErrorKind, usize>,
    /// Sorted by region name
    pub regions: Vec<RegionSummary>,
    pub errors: Vec<ErrorEntry>,
}

impl RunSummary {
    pub fn from_run(run: &Run) -> Self {
        let mut regions: BTreeMap<String, RegionSummary> = run
            .regions
            .iter()
            .map(|r| (r.clone(), RegionSummary::new(r)))
            .collect();
        let mut errors_by_kind = BTreeMap::new();
        let mut errors = Vec::new();

        for measurement in &run.measurements {
            let summary = regions
                .entry(measurement.region().to_string())
                .or_insert_with(|| RegionSummary::new(measurement.region()));

            match measurement {
                Measurement::Result(r) => {
                    if summary.cloud.is_none() {
                        summary.cloud = r.cloud.clone();
                    }
                    summary.pairs.push(PairLatency::from(r));
                }
                Measurement::Skip(_) => summary.skip_count += 1,
                Measurement::Error(e) => {
                    summary.error_count += 1;
                    *errors_by_kind.entry(e.error_kind).or_insert(0) += 1;
                    errors.push(ErrorEntry {
                        region: e.region.clone(),
                        source_az: e.source_az.clone(),
                        target_az: e.target_az.clone(),
                        error_kind: e.error_kind,
                        detail: e.detail.clone(),
                    });
                }
            }
        }

        for summary in regions.values_mut() {
            summary.pairs.sort_by(by_latency);
        }
        errors.sort_by(|a, b| {
            (&a.region, &a.source_az, &a.target_az).cmp(&(&b.region, &b.source_az, &b.target_az))
        });

        Self {
            started_at: run.started_at,
            finished_at: run.finished_at,
            probe_count: run.probe_count_per_measurement,
            clouds: run.clouds.clone(),
            total_measurements: run.measurements.len(),
            total_results: run.count(MeasurementKind::Result),
            total_errors: run.count(MeasurementKind::Error),
            total_skips: run.count(MeasurementKind::Skip),
            errors_by_kind,
            regions: regions.into_values().collect(),
            errors,
        }
    }

    /// Every measured pair, ascending by `avg_ms`
    pub fn all_pairs(&self) -> Vec<&PairLatency> {
        let mut pairs: Vec<&PairLatency> = self.regions.iter().flat_map(|r| r.pairs.iter()).collect();
        pairs.sort_by(|a, b| by_latency(a, b));
        pairs
    }

    pub fn lowest(&self, n: usize) -> Vec<&PairLatency> {
        self.all_pairs().into_iter().take(n).collect()
    }

    /// Highest `n` pairs, slowest first
    pub fn highest(&self, n: usize) -> Vec<&PairLatency> {
        self.all_pairs().into_iter().rev().take(n).collect()
    }

    pub fn fastest(&self) -> Option<&PairLatency> {
        self.all_pairs().first().copied()
    }

    pub fn slowest(&self) -> Option<&PairLatency> {
        self.all_pairs().last().copied()
    }

    /// Mean of all pair averages
    pub fn overall_mean_ms(&self) -> Option<f64> {
        mean(self.regions.iter().flat_map(|r| r.pairs.iter()).map(|p| p.avg_ms))
    }

    pub fn region(&self, name: &str) -> Option<&RegionSummary> {
        self.regions.iter().find(|r| r.region == name)
    }

    pub fn cancelled(&self) -> usize {
        self.errors_by_kind.get(&ProbeErrorKind::Cancelled).copied().unwrap_or(0)
    }

    /// `region`, then ascending `avg_ms`: `az-a<->az-b: 1.000ms`
    pub fn sorted_listing(&self) -> Vec<String> {
        self.regions
            .iter()
            .flat_map(|r| r.pairs.iter())
            .map(|p| format!("{}: {:.3}ms", p.label(), p.avg_ms))
            .collect()
    }
}

fn by_latency(a: &PairLatency, b: &PairLatency) -> Ordering {
    a.avg_ms
        .total_cmp(&b.avg_ms)
        .then_with(|| a.region.cmp(&b.region))
        .then_with(|| a.source_az.cmp(&b.source_az))
        .then_with(|| a.target_az.cmp(&b.target_az))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}
