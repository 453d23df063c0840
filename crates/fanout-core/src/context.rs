//! Per-run correlation context.
//!
//! A `RunContext` is created by the runner for each invocation and handed
//! down by value: the pool clones it into every worker, and each worker
//! derives a child context per task with [`RunContext::for_task`]. Nothing
//! mutates a context after creation.
//!
//! The cancellation token is advisory. The queue and the pool never look at
//! it; tasks that want to stop early select on [`RunContext::cancelled`].

use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{Span, info_span};

use crate::ids::{JobId, TaskId};

/// Task-scoped part of the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskScope {
    pub worker_id: usize,
    pub task_id: TaskId,
    pub task_name: String,
}

#[derive(Debug, Clone)]
pub struct RunContext {
    job_name: Arc<str>,
    job_id: JobId,
    cancel: CancellationToken,
    task: Option<TaskScope>,
}

impl RunContext {
    pub fn new(job_name: impl Into<String>, job_id: JobId, cancel: CancellationToken) -> Self {
        Self {
            job_name: Arc::from(job_name.into()),
            job_id,
            cancel,
            task: None,
        }
    }

    /// Child context for one task execution on `worker_id`.
    pub fn for_task(&self, worker_id: usize, task_id: TaskId, task_name: &str) -> Self {
        Self {
            job_name: Arc::clone(&self.job_name),
            job_id: self.job_id,
            cancel: self.cancel.clone(),
            task: Some(TaskScope {
                worker_id,
                task_id,
                task_name: task_name.to_string(),
            }),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// `None` at job scope (hooks, run-level panics).
    pub fn task(&self) -> Option<&TaskScope> {
        self.task.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the run has been asked to stop.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Tracing span carrying the correlation fields of this context.
    pub fn span(&self) -> Span {
        match &self.task {
            Some(scope) => info_span!(
                "task",
                job_name = %self.job_name,
                job_id = %self.job_id,
                worker_id = scope.worker_id,
                task_id = %scope.task_id,
                task_name = %scope.task_name,
            ),
            None => info_span!("job", job_name = %self.job_name, job_id = %self.job_id),
        }
    }
}
