//! Metrics reporting.
//!
//! The runner reports exactly once per run, after the pool has drained and
//! the after-job hook has returned.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::metrics::MetricsSnapshot;

pub trait MetricsReporter: Send + Sync {
    fn report(&self, snapshot: &MetricsSnapshot);
}

/// Prints the snapshot as one JSON line on stdout.
///
/// Logs go to stderr, so stdout carries nothing but the report.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutReporter;

impl StdoutReporter {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsReporter for StdoutReporter {
    fn report(&self, snapshot: &MetricsSnapshot) {
        tracing::info!(
            job_name = %snapshot.job_name,
            task_total = snapshot.task_total,
            task_success = snapshot.task_success,
            task_failed = snapshot.task_failed,
            "printing metrics to stdout"
        );

        let line = match serde_json::to_string(snapshot) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode metrics");
                return;
            }
        };
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{line}") {
            tracing::warn!(error = %err, "failed to write metrics to stdout");
        }
    }
}

/// Keeps every snapshot it receives. Meant for tests of job logic.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    snapshots: Mutex<Vec<MetricsSnapshot>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<MetricsSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<MetricsSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl MetricsReporter for MemoryReporter {
    fn report(&self, snapshot: &MetricsSnapshot) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}
