//! Wiring between the job registry and the command line.
//!
//! ```ignore
//! let mut registry = JobRegistry::new();
//! registry.add_job(Box::new(MyJob::default()))?;
//!
//! let mut run_job = CommandBuilder::new(registry)
//!     .with_cancellation_token(shutdown)
//!     .with_panic_handler(handler)
//!     .build();
//!
//! let matches = run_job.command().get_matches();
//! run_job.execute(&matches).await?;
//! ```

use std::sync::Arc;

use clap::{ArgMatches, Command};
use tokio_util::sync::CancellationToken;

use crate::error::{CommandError, JobError, RegistryError};
use crate::job::Job;
use crate::panic::PanicHandler;
use crate::registry::JobRegistry;
use crate::reporter::{MetricsReporter, StdoutReporter};
use crate::runner::{AfterJobHook, BeforeJobHook, JobRunner, Runner};

pub struct CommandBuilder {
    registry: JobRegistry,
    cancel: Option<CancellationToken>,
    before_job: Option<BeforeJobHook>,
    after_job: Option<AfterJobHook>,
    panic_handler: Option<PanicHandler>,
    reporter: Option<Arc<dyn MetricsReporter>>,
}

impl CommandBuilder {
    pub fn new(registry: JobRegistry) -> Self {
        Self {
            registry,
            cancel: None,
            before_job: None,
            after_job: None,
            panic_handler: None,
            reporter: None,
        }
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_before_job(mut self, hook: BeforeJobHook) -> Self {
        self.before_job = Some(hook);
        self
    }

    pub fn with_after_job(mut self, hook: AfterJobHook) -> Self {
        self.after_job = Some(hook);
        self
    }

    pub fn with_panic_handler(mut self, handler: PanicHandler) -> Self {
        self.panic_handler = Some(handler);
        self
    }

    /// Defaults to [`StdoutReporter`].
    pub fn with_metrics_reporter(mut self, reporter: Arc<dyn MetricsReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> JobCommand {
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(StdoutReporter::new()));

        let mut runner = JobRunner::new(reporter)
            .with_before_job(self.before_job)
            .with_after_job(self.after_job)
            .with_panic_handler(self.panic_handler);
        if let Some(cancel) = self.cancel {
            runner = runner.with_cancellation_token(cancel);
        }

        JobCommand {
            registry: self.registry,
            runner,
        }
    }
}

/// The `run-job` command: one subcommand per registered job.
pub struct JobCommand {
    registry: JobRegistry,
    runner: JobRunner,
}

impl JobCommand {
    pub const NAME: &'static str = "run-job";

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(Self::NAME)
            .about("Run a registered job")
            .subcommand_required(true)
            .arg_required_else_help(true);

        for job in self.registry.iter() {
            let metadata = job.metadata();
            let sub = Command::new(metadata.name).about(metadata.description);
            cmd = cmd.subcommand(job.add_flags(sub));
        }
        cmd
    }

    /// Runs the job selected in `matches`, which must come from
    /// [`JobCommand::command`].
    pub async fn execute(&mut self, matches: &ArgMatches) -> Result<(), CommandError> {
        let (name, job_matches) = matches.subcommand().ok_or(CommandError::NoJobSelected)?;

        let job = self
            .registry
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownJob(name.to_string()))?;
        job.apply_flags(job_matches).map_err(JobError::InvalidFlags)?;

        let job: &dyn Job = &**job;
        tracing::debug!(job_name = name, worker_count = job.worker_count(), "dispatching job");
        self.runner.run(job, job.worker_count()).await?;
        Ok(())
    }
}
