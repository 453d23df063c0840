//! Job abstraction.

use clap::{ArgMatches, Command};

use crate::error::JobError;
use crate::task::Task;

/// Identifying information for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// CLI name of the job (subcommand name).
    pub name: String,
    /// Shown in CLI help output.
    pub description: String,
}

impl Metadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A class of work: produces a batch of independent tasks and says how many
/// workers should drain them.
///
/// Jobs are registered once per process and run once per invocation.
pub trait Job: Send + Sync {
    fn metadata(&self) -> Metadata;

    /// Registers job-specific options on the job's subcommand.
    fn add_flags(&self, cmd: Command) -> Command {
        cmd
    }

    /// Reads back the options registered by [`Job::add_flags`] after parsing.
    fn apply_flags(&mut self, _matches: &ArgMatches) -> anyhow::Result<()> {
        Ok(())
    }

    /// Produces the task list. Called once per run, after the before-job hook.
    fn tasks(&self) -> anyhow::Result<Vec<Box<dyn Task>>>;

    fn worker_count(&self) -> usize;
}

pub(crate) fn validate_worker_count(workers: usize) -> Result<(), JobError> {
    if workers == 0 {
        return Err(JobError::InvalidWorkerCount(workers));
    }
    Ok(())
}
