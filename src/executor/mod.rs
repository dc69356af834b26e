//! Bounded-concurrency probe coordination
//!
//! Regions are swept one after another. Within a region every pair gets its
//! own task, a semaphore caps how many probe at once, and finished
//! measurements flow back over a channel to the single owner that appends
//! them to the [`Run`] in completion order.
//!
//! Cancellation (caller request or run deadline) turns tasks still waiting for
//! a permit into `cancelled` measurements and abandons in-flight probes by
//! dropping their futures, so every planned pair still yields exactly one
//! measurement.

use crate::{
    error::Result,
    logging::ProbeLogger,
    models::{Measurement, Pair, Run},
    planner::PairPlan,
    probe::ProbeExecutor,
    types::ProbeErrorKind,
};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::time::Instant;

/// Reason recorded when the run deadline expires
pub const DEADLINE_REASON: &str = "run deadline reached";

/// Caller side of cancellation; clones share one cancellation state
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(None);
        (Self { tx: Arc::new(tx) }, CancelSignal { rx, deadline: None })
    }

    /// First reason wins; later calls are ignored
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

/// Observer side of cancellation, optionally bounded by a deadline
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<Option<String>>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, signal) = CancelHandle::new();
        signal
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the run is cancelled, if it is
    pub fn reason(&self) -> Option<String> {
        if let Some(reason) = self.rx.borrow().clone() {
            return Some(reason);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DEADLINE_REASON.to_string()),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves with the reason once cancellation fires
    pub async fn cancelled(&self) -> String {
        let mut rx = self.rx.clone();
        let requested = async move {
            loop {
                if let Some(reason) = rx.borrow_and_update().clone() {
                    return reason;
                }
                if rx.changed().await.is_err() {
                    // Handle dropped without cancelling
                    std::future::pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                reason = requested => reason,
                _ = tokio::time::sleep_until(deadline) => DEADLINE_REASON.to_string(),
            },
            None => requested.await,
        }
    }
}

/// Drives one [`ProbeExecutor`] over a pair plan
pub struct Coordinator<E> {
    executor: Arc<E>,
    max_concurrency: usize,
    logger: ProbeLogger,
}

impl<E: ProbeExecutor + 'static> Coordinator<E> {
    pub fn new(executor: E, max_concurrency: usize, logger: ProbeLogger) -> Self {
        Self {
            executor: Arc::new(executor),
            max_concurrency: max_concurrency.max(1),
            logger,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Sweep every region of `plan` in order, appending to `run`.
    ///
    /// `on_region` runs after each region that had pairs, with the run as it
    /// stands at that point. A checkpoint it reports is logged before the next
    /// region starts.
    pub async fn run_plan<F>(&self, plan: &PairPlan, run: &mut Run, cancel: &CancelSignal, mut on_region: F)
    where
        F: FnMut(&str, &Run) -> Option<Result<PathBuf>>,
    {
        let mut announced = false;

        for (region, pairs) in plan.regions() {
            if pairs.is_empty() {
                self.logger.region_skipped(region).await;
                continue;
            }

            let started = StdInstant::now();
            let correlation_id = self.logger.region_started(region, node_count(pairs), pairs.len()).await;

            for measurement in self.run_region(region, pairs, cancel).await {
                run.record(measurement);
            }

            self.logger.region_finished(&correlation_id, region, started.elapsed()).await;
            if let Some(outcome) = on_region(region, run) {
                self.logger.checkpoint(&outcome, run.measurements.len()).await;
            }

            if !announced {
                if let Some(reason) = cancel.reason() {
                    self.logger.cancelled(&reason).await;
                    announced = true;
                }
            }
        }
    }

    /// Probe one region's pairs; returns measurements in completion order
    pub async fn run_region(&self, region: &str, pairs: &[Pair], cancel: &CancelSignal) -> Vec<Measurement> {
        if pairs.is_empty() {
            return Vec::new();
        }

        if let Some(reason) = cancel.reason() {
            let measurements: Vec<Measurement> = pairs
                .iter()
                .map(|pair| Measurement::cancelled(pair, format!("not started: {}", reason)))
                .collect();
            for m in &measurements {
                self.logger.probe_completed(m).await;
            }
            return measurements;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let (tx, mut rx) = mpsc::channel::<(usize, Measurement)>(pairs.len());
        let mut tasks = Vec::with_capacity(pairs.len());

        for (index, pair) in pairs.iter().cloned().enumerate() {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let tx = tx.clone();

            tasks.push(tokio::spawn(async move {
                let measurement = probe_task(executor, semaphore, &pair, cancel).await;
                let _ = tx.send((index, measurement)).await;
            }));
        }
        drop(tx);

        let mut reported = vec![false; pairs.len()];
        let mut measurements = Vec::with_capacity(pairs.len());

        while let Some((index, measurement)) = rx.recv().await {
            reported[index] = true;
            self.logger.probe_completed(&measurement).await;
            measurements.push(measurement);
        }

        for outcome in join_all(tasks).await {
            if let Err(e) = outcome {
                self.logger
                    .logger()
                    .error("Probe task aborted")
                    .field("region", region)
                    .field("error", e.to_string())
                    .log()
                    .await;
            }
        }

        // A task that died before reporting still owes its pair a measurement
        for (index, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
            let measurement = Measurement::error(
                &pairs[index],
                ProbeErrorKind::ProbeFailed,
                Some("probe task terminated unexpectedly".to_string()),
            );
            self.logger.probe_completed(&measurement).await;
            measurements.push(measurement);
        }

        measurements
    }
}

async fn probe_task<E: ProbeExecutor>(
    executor: Arc<E>,
    semaphore: Arc<Semaphore>,
    pair: &Pair,
    cancel: CancelSignal,
) -> Measurement {
    let permit = tokio::select! {
        biased;
        reason = cancel.cancelled() => {
            return Measurement::cancelled(pair, format!("not started: {}", reason));
        }
        permit = semaphore.acquire_owned() => permit,
    };

    let Ok(_permit) = permit else {
        return Measurement::error(pair, ProbeErrorKind::ProbeFailed, Some("worker pool closed".to_string()));
    };

    tokio::select! {
        biased;
        reason = cancel.cancelled() => Measurement::cancelled(pair, format!("abandoned in flight: {}", reason)),
        measurement = executor.probe(pair) => measurement,
    }
}

/// Distinct AZs covered by a region's pairs
fn node_count(pairs: &[Pair]) -> usize {
    pairs
        .iter()
        .flat_map(|p| [p.source_az(), p.target_az()])
        .collect::<BTreeSet<_>>()
        .len()
}
