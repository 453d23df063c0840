//! Job runners.
//!
//! [`JobRunner`] drives one invocation through a fixed sequence:
//!
//! 1. validate the worker count
//! 2. before-job hook (optional; an error aborts the run)
//! 3. ask the job for its tasks and queue them (an error aborts the run)
//! 4. drain the queue with a [`WorkerPool`]
//! 5. after-job hook (optional; always runs once the pool has started)
//! 6. report one metrics snapshot
//! 7. decide the outcome: no tasks is fine, all tasks failed is an error,
//!    anything else succeeds
//!
//! Panics inside tasks are contained by the pool, unless the panic handler
//! itself panics; that panic reaches the caller. A panic in the runner's own
//! path (hooks, task production, reporting) is forwarded to the panic handler,
//! logged, and then resumed so the caller sees it.
//!
//! [`TestRunner`] keeps only steps 1, 3, 4 and 7, for exercising job logic in
//! tests without hooks or reporting.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::RunContext;
use crate::error::JobError;
use crate::job::{Job, validate_worker_count};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::panic::{PanicHandler, panic_message};
use crate::pool::WorkerPool;
use crate::ports::{IdGenerator, default_id_generator};
use crate::queue::TaskQueue;
use crate::reporter::{MetricsReporter, StdoutReporter};

/// Runs before any task is produced. An error aborts the run and is returned
/// unchanged.
pub type BeforeJobHook =
    Arc<dyn Fn(RunContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Runs after the pool has drained, whatever the task outcomes. It cannot
/// fail the run.
pub type AfterJobHook = Arc<dyn Fn(RunContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure as a [`BeforeJobHook`].
pub fn before_job_hook<F, Fut>(hook: F) -> BeforeJobHook
where
    F: Fn(RunContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx: RunContext| hook(ctx).boxed())
}

/// Wraps an async closure as an [`AfterJobHook`].
pub fn after_job_hook<F, Fut>(hook: F) -> AfterJobHook
where
    F: Fn(RunContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx: RunContext| hook(ctx).boxed())
}

#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, job: &dyn Job, worker_count: usize) -> Result<(), JobError>;
}

#[derive(Clone)]
pub struct JobRunner {
    before_job: Option<BeforeJobHook>,
    after_job: Option<AfterJobHook>,
    panic_handler: Option<PanicHandler>,
    reporter: Arc<dyn MetricsReporter>,
    ids: Arc<dyn IdGenerator>,
    cancel: CancellationToken,
}

impl JobRunner {
    pub fn new(reporter: Arc<dyn MetricsReporter>) -> Self {
        Self {
            before_job: None,
            after_job: None,
            panic_handler: None,
            reporter,
            ids: default_id_generator(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_before_job(mut self, hook: Option<BeforeJobHook>) -> Self {
        self.before_job = hook;
        self
    }

    pub fn with_after_job(mut self, hook: Option<AfterJobHook>) -> Self {
        self.after_job = hook;
        self
    }

    pub fn with_panic_handler(mut self, handler: Option<PanicHandler>) -> Self {
        self.panic_handler = handler;
        self
    }

    /// Token placed in every run context. Cancelling it is advisory.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        job: &dyn Job,
        worker_count: usize,
    ) -> Result<(), JobError> {
        validate_worker_count(worker_count)?;

        if let Some(before_job) = &self.before_job {
            tracing::info!("executing beforeJob hook");
            if let Err(err) = before_job(ctx.clone()).await {
                tracing::error!(error = %format!("{err:#}"), "error executing beforeJob hook");
                return Err(JobError::BeforeJob(err));
            }
        }

        let (queue, metrics) = match populate(job) {
            Ok(populated) => populated,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "error getting tasks");
                return Err(err);
            }
        };
        tracing::info!(task_total = queue.len(), "queued all the tasks");

        let metrics = Arc::new(metrics);
        WorkerPool::new(Arc::new(queue), worker_count, Arc::clone(&metrics))
            .with_panic_handler(self.panic_handler.clone())
            .with_id_generator(Arc::clone(&self.ids))
            .run(ctx)
            .await;

        if let Some(after_job) = &self.after_job {
            tracing::info!("executing afterJob hook");
            after_job(ctx.clone()).await;
        }

        let snapshot = metrics.snapshot();
        self.reporter.report(&snapshot);

        let outcome = decide(&snapshot);
        match &outcome {
            Ok(()) if snapshot.task_total == 0 => tracing::info!("no tasks to run"),
            Ok(()) => tracing::info!(
                task_success = snapshot.task_success,
                task_failed = snapshot.task_failed,
                "job executed successfully"
            ),
            Err(err) => tracing::error!(task_total = snapshot.task_total, "{err}"),
        }
        outcome
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new(Arc::new(StdoutReporter::new()))
    }
}

#[async_trait]
impl Runner for JobRunner {
    async fn run(&self, job: &dyn Job, worker_count: usize) -> Result<(), JobError> {
        let ctx = RunContext::new(
            job.metadata().name,
            self.ids.generate_job_id(),
            self.cancel.clone(),
        );
        let span = ctx.span();

        let result = AssertUnwindSafe(self.execute(&ctx, job, worker_count))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        match result {
            Ok(outcome) => outcome,
            Err(payload) => {
                if let Some(handler) = &self.panic_handler {
                    handler(&ctx, &*payload);
                }
                tracing::error!(
                    parent: &span,
                    panic = %panic_message(&*payload),
                    "job panicked"
                );
                // Unlike task panics, a panic on the run path must stay visible.
                std::panic::resume_unwind(payload)
            }
        }
    }
}

/// Minimal runner for testing job logic: no hooks, no reporting, no panic
/// handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestRunner;

impl TestRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for TestRunner {
    async fn run(&self, job: &dyn Job, worker_count: usize) -> Result<(), JobError> {
        validate_worker_count(worker_count)?;

        let (queue, metrics) = populate(job)?;
        let ids = default_id_generator();
        let ctx = RunContext::new(
            metrics.job_name().to_string(),
            ids.generate_job_id(),
            CancellationToken::new(),
        );

        let metrics = Arc::new(metrics);
        WorkerPool::new(Arc::new(queue), worker_count, Arc::clone(&metrics))
            .with_id_generator(ids)
            .run(&ctx)
            .await;

        decide(&metrics.snapshot())
    }
}

/// Queue every task the job produces and size the collector accordingly.
fn populate(job: &dyn Job) -> Result<(TaskQueue, MetricsCollector), JobError> {
    let queue: TaskQueue = job
        .tasks()
        .map_err(JobError::TaskProduction)?
        .into_iter()
        .collect();
    let mut metrics = MetricsCollector::new(job.metadata().name);
    metrics.set_task_total(task_total(queue.len())?);
    Ok((queue, metrics))
}

/// Counters are `u32`; a larger batch is rejected rather than under-counted.
fn task_total(len: usize) -> Result<u32, JobError> {
    u32::try_from(len).map_err(|_| JobError::TooManyTasks(len))
}

fn decide(snapshot: &MetricsSnapshot) -> Result<(), JobError> {
    if snapshot.all_failed() {
        return Err(JobError::AllTasksFailed {
            job: snapshot.job_name.clone(),
            total: snapshot.task_total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Metadata;
    use crate::reporter::MemoryReporter;
    use crate::task::{Task, TaskError};
    use rstest::rstest;
    use std::any::Any;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Outcome(bool);

    #[async_trait]
    impl Task for Outcome {
        fn task_name(&self) -> &str {
            if self.0 { "ok" } else { "err" }
        }

        async fn process(&self, _ctx: &RunContext) -> Result<(), TaskError> {
            if self.0 {
                Ok(())
            } else {
                anyhow::bail!("nope")
            }
        }
    }

    struct Panicking;

    #[async_trait]
    impl Task for Panicking {
        fn task_name(&self) -> &str {
            "panicking"
        }

        async fn process(&self, _ctx: &RunContext) -> Result<(), TaskError> {
            panic!("task exploded")
        }
    }

    /// Job built from a list of task outcomes.
    struct ScriptedJob {
        outcomes: Vec<bool>,
        produced: AtomicUsize,
    }

    impl ScriptedJob {
        fn new(outcomes: Vec<bool>) -> Self {
            Self {
                outcomes,
                produced: AtomicUsize::new(0),
            }
        }
    }

    impl Job for ScriptedJob {
        fn metadata(&self) -> Metadata {
            Metadata::new("scripted", "runs a fixed list of outcomes")
        }

        fn tasks(&self) -> anyhow::Result<Vec<Box<dyn Task>>> {
            self.produced.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .outcomes
                .iter()
                .map(|&ok| Box::new(Outcome(ok)) as Box<dyn Task>)
                .collect())
        }

        fn worker_count(&self) -> usize {
            2
        }
    }

    fn recording_runner() -> (JobRunner, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        (JobRunner::new(reporter.clone()), reporter)
    }

    #[rstest]
    #[case::no_tasks(vec![], true)]
    #[case::all_succeed(vec![true, true, true], true)]
    #[case::partial_failure(vec![true, false, true], true)]
    #[case::single_failure(vec![false], false)]
    #[case::all_fail(vec![false, false, false], false)]
    #[tokio::test]
    async fn outcome_follows_aggregate(#[case] outcomes: Vec<bool>, #[case] expect_ok: bool) {
        let (runner, reporter) = recording_runner();
        let job = ScriptedJob::new(outcomes.clone());

        let result = runner.run(&job, 2).await;

        assert_eq!(result.is_ok(), expect_ok);
        let snapshot = reporter.last().expect("one report");
        assert_eq!(snapshot.task_total as usize, outcomes.len());
        assert_eq!(
            snapshot.task_failed as usize,
            outcomes.iter().filter(|ok| !**ok).count()
        );
        assert_eq!(reporter.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn all_failed_error_carries_job_and_total() {
        let (runner, _) = recording_runner();

        let err = runner
            .run(&ScriptedJob::new(vec![false, false]), 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            JobError::AllTasksFailed { ref job, total: 2 } if job == "scripted"
        ));
    }

    #[tokio::test]
    async fn zero_workers_fail_before_tasks_are_produced() {
        let (runner, reporter) = recording_runner();
        let job = ScriptedJob::new(vec![true]);

        let err = runner.run(&job, 0).await.unwrap_err();

        assert!(matches!(err, JobError::InvalidWorkerCount(0)));
        assert_eq!(job.produced.load(Ordering::SeqCst), 0);
        assert!(reporter.snapshots().is_empty());
    }

    #[tokio::test]
    async fn hooks_run_in_order_around_the_pool() {
        let events = Arc::new(Mutex::new(Vec::<String>::new()));
        let before = {
            let events = Arc::clone(&events);
            before_job_hook(move |ctx| {
                let events = Arc::clone(&events);
                async move {
                    events.lock().unwrap().push(format!("before:{}", ctx.job_name()));
                    Ok(())
                }
            })
        };
        let after = {
            let events = Arc::clone(&events);
            after_job_hook(move |ctx| {
                let events = Arc::clone(&events);
                async move {
                    assert!(ctx.task().is_none());
                    events.lock().unwrap().push("after".to_string());
                }
            })
        };
        let (runner, reporter) = recording_runner();
        let runner = runner
            .with_before_job(Some(before))
            .with_after_job(Some(after));

        // All tasks fail: the after hook and the report still happen.
        let result = runner.run(&ScriptedJob::new(vec![false, false]), 1).await;

        assert!(matches!(result, Err(JobError::AllTasksFailed { .. })));
        assert_eq!(*events.lock().unwrap(), vec!["before:scripted", "after"]);
        assert_eq!(reporter.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn before_hook_error_skips_everything_else() {
        let after_calls = Arc::new(AtomicUsize::new(0));
        let before = before_job_hook(|_ctx| async { Err::<(), _>(anyhow::anyhow!("no credentials")) });
        let after = {
            let after_calls = Arc::clone(&after_calls);
            after_job_hook(move |_ctx| {
                after_calls.fetch_add(1, Ordering::SeqCst);
                async {}
            })
        };
        let (runner, reporter) = recording_runner();
        let runner = runner
            .with_before_job(Some(before))
            .with_after_job(Some(after));
        let job = ScriptedJob::new(vec![true]);

        let err = runner.run(&job, 1).await.unwrap_err();

        assert_eq!(err.to_string(), "no credentials");
        assert!(matches!(err, JobError::BeforeJob(_)));
        assert_eq!(job.produced.load(Ordering::SeqCst), 0);
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
        assert!(reporter.snapshots().is_empty());
    }

    #[tokio::test]
    async fn task_production_error_is_returned_unchanged() {
        struct Broken;

        impl Job for Broken {
            fn metadata(&self) -> Metadata {
                Metadata::new("broken", "cannot list its tasks")
            }

            fn tasks(&self) -> anyhow::Result<Vec<Box<dyn Task>>> {
                anyhow::bail!("missing CLUSTER_ID")
            }

            fn worker_count(&self) -> usize {
                1
            }
        }

        let (runner, reporter) = recording_runner();

        let err = runner.run(&Broken, 1).await.unwrap_err();

        assert!(matches!(err, JobError::TaskProduction(_)));
        assert_eq!(err.to_string(), "missing CLUSTER_ID");
        assert!(reporter.snapshots().is_empty());
    }

    #[tokio::test]
    async fn run_level_panic_is_forwarded_then_resumed() {
        struct Exploding;

        impl Job for Exploding {
            fn metadata(&self) -> Metadata {
                Metadata::new("exploding", "panics while producing tasks")
            }

            fn tasks(&self) -> anyhow::Result<Vec<Box<dyn Task>>> {
                panic!("task list corrupted")
            }

            fn worker_count(&self) -> usize {
                1
            }
        }

        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let handler: PanicHandler = {
            let seen = Arc::clone(&seen);
            Arc::new(move |ctx: &RunContext, payload: &(dyn Any + Send)| {
                assert!(ctx.task().is_none());
                seen.lock().unwrap().push(panic_message(payload));
            })
        };
        let (runner, _) = recording_runner();
        let runner = runner.with_panic_handler(Some(handler));

        let resumed = AssertUnwindSafe(runner.run(&Exploding, 1))
            .catch_unwind()
            .await
            .unwrap_err();

        assert_eq!(panic_message(&*resumed), "task list corrupted");
        assert_eq!(*seen.lock().unwrap(), vec!["task list corrupted"]);
    }

    #[tokio::test]
    async fn panicking_panic_handler_is_not_reported_as_success() {
        fn faulty_handler(_ctx: &RunContext, _payload: &(dyn Any + Send)) {
            panic!("handler bug");
        }

        struct FirstPanics;

        impl Job for FirstPanics {
            fn metadata(&self) -> Metadata {
                Metadata::new("first-panics", "first task panics, the rest succeed")
            }

            fn tasks(&self) -> anyhow::Result<Vec<Box<dyn Task>>> {
                Ok(vec![
                    Box::new(Panicking) as Box<dyn Task>,
                    Box::new(Outcome(true)),
                    Box::new(Outcome(true)),
                ])
            }

            fn worker_count(&self) -> usize {
                1
            }
        }

        let handler: PanicHandler = Arc::new(faulty_handler);
        let (runner, reporter) = recording_runner();
        let runner = runner.with_panic_handler(Some(handler));

        let resumed = AssertUnwindSafe(runner.run(&FirstPanics, 1))
            .catch_unwind()
            .await
            .unwrap_err();

        assert_eq!(panic_message(&*resumed), "handler bug");
        assert!(reporter.snapshots().is_empty());
    }

    #[test]
    fn task_total_fits_u32() {
        assert_eq!(task_total(0).unwrap(), 0);
        assert_eq!(task_total(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn task_total_beyond_u32_is_a_configuration_error() {
        let len = u32::MAX as usize + 1;

        let err = task_total(len).unwrap_err();

        assert!(matches!(err, JobError::TooManyTasks(n) if n == len));
        assert!(err.is_configuration());
    }

    #[rstest]
    #[case::no_tasks(vec![], true)]
    #[case::partial_failure(vec![false, true], true)]
    #[case::all_fail(vec![false, false], false)]
    #[tokio::test]
    async fn test_runner_applies_the_same_outcome_rule(
        #[case] outcomes: Vec<bool>,
        #[case] expect_ok: bool,
    ) {
        let result = TestRunner::new()
            .run(&ScriptedJob::new(outcomes), 3)
            .await;

        assert_eq!(result.is_ok(), expect_ok);
    }

    #[tokio::test]
    async fn test_runner_validates_worker_count() {
        let job = ScriptedJob::new(vec![true]);

        let err = TestRunner::new().run(&job, 0).await.unwrap_err();

        assert!(matches!(err, JobError::InvalidWorkerCount(0)));
        assert_eq!(job.produced.load(Ordering::SeqCst), 0);
    }
}
