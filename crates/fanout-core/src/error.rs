use thiserror::Error;

/// Errors a job run can end with.
///
/// Task-level failures never show up here: they are counted in the metrics
/// and logged. Only configuration problems and the "every task failed"
/// aggregate reach the caller.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("number of workers must be greater than zero (got {0})")]
    InvalidWorkerCount(usize),

    /// The before-job hook failed; its error is passed through unchanged.
    #[error(transparent)]
    BeforeJob(anyhow::Error),

    /// The job could not produce its task list.
    #[error(transparent)]
    TaskProduction(anyhow::Error),

    /// The job rejected the flags it was invoked with.
    #[error(transparent)]
    InvalidFlags(anyhow::Error),

    /// More tasks than the metrics counters can hold.
    #[error("job produced {0} tasks, more than a single run can count")]
    TooManyTasks(usize),

    #[error("all tasks failed")]
    AllTasksFailed { job: String, total: u32 },
}

impl JobError {
    /// True when the run was aborted before any task executed.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, JobError::AllTasksFailed { .. })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job '{0}' is already registered")]
    DuplicateJob(String),

    #[error("unknown job '{0}'")]
    UnknownJob(String),
}

/// Errors from dispatching a parsed `run-job` command line.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no job selected")]
    NoJobSelected,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Job(#[from] JobError),
}
