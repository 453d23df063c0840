//! Task outcome counters for one job run.
//!
//! All three counters live behind one mutex so a snapshot is a point-in-time
//! view of the whole set: `task_success + task_failed <= task_total` holds in
//! every snapshot, and equality holds once the pool has drained.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Immutable copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub job_name: String,
    pub task_total: u32,
    pub task_success: u32,
    pub task_failed: u32,
}

impl MetricsSnapshot {
    /// Tasks that finished, either way.
    pub fn task_completed(&self) -> u32 {
        self.task_success + self.task_failed
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.task_total > 0 && self.task_failed == self.task_total
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    total: u32,
    success: u32,
    failed: u32,
}

#[derive(Debug)]
pub struct MetricsCollector {
    job_name: String,
    counters: Mutex<Counters>,
}

impl MetricsCollector {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Set once, before the collector is shared with workers.
    pub fn set_task_total(&mut self, total: u32) {
        self.counters
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .total = total;
    }

    pub fn inc_task_success(&self) {
        self.lock().success += 1;
    }

    pub fn inc_task_failed(&self) {
        self.lock().failed += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = *self.lock();
        MetricsSnapshot {
            job_name: self.job_name.clone(),
            task_total: counters.total,
            task_success: counters.success,
            task_failed: counters.failed,
        }
    }

    // Counters are plain integers; a poisoned guard still holds whole values.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
