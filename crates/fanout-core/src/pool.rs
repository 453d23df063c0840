//! Fixed-size worker pool.
//!
//! `run` spawns `workers` tokio tasks that drain the shared queue and returns
//! once every one of them has exited. A worker stops only when the queue is
//! empty: failures and panics inside a task are recorded and the worker moves
//! on to the next item.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tracing::Instrument;

use crate::context::RunContext;
use crate::metrics::MetricsCollector;
use crate::panic::{PanicHandler, panic_message};
use crate::ports::{IdGenerator, default_id_generator};
use crate::queue::TaskQueue;
use crate::task::Task;

pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    workers: usize,
    metrics: Arc<MetricsCollector>,
    panic_handler: Option<PanicHandler>,
    ids: Arc<dyn IdGenerator>,
}

impl WorkerPool {
    /// `workers` must already be validated (>= 1).
    pub fn new(queue: Arc<TaskQueue>, workers: usize, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            queue,
            workers,
            metrics,
            panic_handler: None,
            ids: default_id_generator(),
        }
    }

    pub fn with_panic_handler(mut self, handler: Option<PanicHandler>) -> Self {
        self.panic_handler = handler;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Drain the queue. Returns when every worker has exited.
    ///
    /// # Panics
    /// Re-raises a panic thrown by the panic handler, once all workers have
    /// stopped.
    pub async fn run(self, ctx: &RunContext) {
        let mut joins = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let worker = Worker {
                id: worker_id,
                queue: Arc::clone(&self.queue),
                metrics: Arc::clone(&self.metrics),
                panic_handler: self.panic_handler.clone(),
                ids: Arc::clone(&self.ids),
            };
            let ctx = ctx.clone();
            joins.push(tokio::spawn(async move { worker.run(ctx).await }));
        }

        let results = join_all(joins).await;
        let mut escaped = None;
        for (worker_id, result) in results.into_iter().enumerate() {
            // Task panics are caught inside the worker. A join error means the
            // panic handler itself panicked or the runtime dropped the worker.
            if let Err(err) = result {
                tracing::error!(
                    job_id = %ctx.job_id(),
                    worker_id,
                    error = %err,
                    "worker exited abnormally"
                );
                if err.is_panic() && escaped.is_none() {
                    escaped = Some(err.into_panic());
                }
            }
        }

        // The dead worker's share of the queue may never have run, so the
        // counters cannot be trusted. Surface the panic to the caller.
        if let Some(payload) = escaped {
            std::panic::resume_unwind(payload);
        }
    }
}

struct Worker {
    id: usize,
    queue: Arc<TaskQueue>,
    metrics: Arc<MetricsCollector>,
    panic_handler: Option<PanicHandler>,
    ids: Arc<dyn IdGenerator>,
}

impl Worker {
    async fn run(self, ctx: RunContext) {
        while let Some(task) = self.queue.get_task() {
            self.execute(&ctx, task).await;
        }
        tracing::info!(
            job_id = %ctx.job_id(),
            worker_id = self.id,
            "no more tasks in queue"
        );
    }

    async fn execute(&self, ctx: &RunContext, task: Box<dyn Task>) {
        let task_ctx = ctx.for_task(self.id, self.ids.generate_task_id(), task.task_name());
        let span = task_ctx.span();

        async {
            tracing::info!("processing task");
            match AssertUnwindSafe(task.process(&task_ctx)).catch_unwind().await {
                Ok(Ok(())) => {
                    self.metrics.inc_task_success();
                    tracing::info!("task succeeded");
                }
                Ok(Err(err)) => {
                    self.metrics.inc_task_failed();
                    tracing::error!(error = %format!("{err:#}"), "task failed");
                }
                Err(payload) => {
                    self.metrics.inc_task_failed();
                    tracing::error!(panic = %panic_message(&*payload), "task panicked");
                    if let Some(handler) = &self.panic_handler {
                        handler(&task_ctx, &*payload);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}
