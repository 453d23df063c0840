//! fanout-core
//!
//! Generic job execution: a [`Job`] produces independent [`Task`]s, a fixed
//! pool of workers drains them, and the run ends with one metrics report and
//! an outcome.
//!
//! # Modules
//! - **job / task**: the two traits user code implements
//! - **queue / pool**: shared task queue and the worker pool draining it
//! - **metrics / reporter**: per-run counters and where snapshots go
//! - **runner**: `JobRunner` (hooks, panic forwarding, reporting) and `TestRunner`
//! - **registry / command**: job registration and the `run-job` CLI command
//! - **ports**: clock and id generator seams

pub mod command;
pub mod context;
pub mod error;
pub mod ids;
pub mod job;
pub mod metrics;
pub mod panic;
pub mod pool;
pub mod ports;
pub mod queue;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod task;

pub use command::{CommandBuilder, JobCommand};
pub use context::{RunContext, TaskScope};
pub use error::{CommandError, JobError, RegistryError};
pub use ids::{JobId, TaskId};
pub use job::{Job, Metadata};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use panic::{PanicHandler, panic_message};
pub use registry::JobRegistry;
pub use reporter::{MemoryReporter, MetricsReporter, StdoutReporter};
pub use runner::{
    AfterJobHook, BeforeJobHook, JobRunner, Runner, TestRunner, after_job_hook, before_job_hook,
};
pub use task::{Task, TaskError};
