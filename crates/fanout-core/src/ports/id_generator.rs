//! IdGenerator port.
//!
//! The runner asks for a fresh `JobId` per invocation and the worker pool for
//! a fresh `TaskId` per dequeued task.
//!
//! # Implementations
//! - [`UlidGenerator`]: ULID based, timestamped by an injected [`Clock`]

use crate::ids::{JobId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// Mints identifiers for runs and tasks.
///
/// # Thread Safety
/// Requires `Send + Sync`: a single generator is shared by every worker of
/// a run.
pub trait IdGenerator: Send + Sync {
    /// Id for one job invocation.
    fn generate_job_id(&self) -> JobId;

    /// Id for one task execution.
    fn generate_task_id(&self) -> TaskId;
}

/// ULID generator: millisecond timestamp from the clock, 80 random bits.
///
/// Timestamps before the Unix epoch are clamped to zero. With a
/// [`FixedClock`](crate::ports::FixedClock) every id shares the timestamp
/// part.
#[derive(Debug, Clone, Default)]
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_id(&self) -> JobId {
        JobId::from(self.next_ulid())
    }

    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }
}
