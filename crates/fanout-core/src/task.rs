use async_trait::async_trait;

use crate::context::RunContext;

/// Error returned by a task. The framework imposes no taxonomy.
pub type TaskError = anyhow::Error;

/// A unit of work processed by exactly one worker, exactly once.
///
/// Retries, timeouts and cancellation handling are up to the implementation;
/// the pool records the outcome and moves on.
///
/// # Example
/// ```ignore
/// struct Ping { host: String }
///
/// #[async_trait]
/// impl Task for Ping {
///     fn task_name(&self) -> &str {
///         &self.host
///     }
///
///     async fn process(&self, ctx: &RunContext) -> Result<(), TaskError> {
///         tokio::select! {
///             _ = ctx.cancelled() => anyhow::bail!("cancelled"),
///             res = ping(&self.host) => res,
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Stable name used in logs.
    fn task_name(&self) -> &str;

    async fn process(&self, ctx: &RunContext) -> Result<(), TaskError>;
}
