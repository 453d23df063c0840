//! Strongly-typed identifiers.
//!
//! Every job run and every task execution gets a ULID so log lines from
//! concurrent workers can be correlated.
//!
//! ## ULID properties
//! - sortable by creation time, so task ids of one run come out roughly in
//!   the order the tasks were picked up
//! - generated without coordination between workers
//! - 128 bits, printed as 26 Crockford base32 characters
//!
//! ## Phantom type markers
//! `Id<T>` carries a zero-sized marker `T`. A `JobId` and a `TaskId` share
//! one representation but are distinct types, so one can never be passed
//! where the other is expected:
//!
//! ```compile_fail
//! use fanout_core::ids::{JobId, TaskId};
//! use ulid::Ulid;
//!
//! fn takes_task(_id: TaskId) {}
//! takes_task(JobId::from(Ulid::nil()));
//! ```
//!
//! ## Display format
//! Ids print with a kind prefix (`job-`, `task-`) followed by the ULID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for each id kind; supplies the display prefix.
///
/// Markers are uninhabited enums: they exist only at the type level.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed identifier.
///
/// # Thread Safety
/// `Copy`, and `Send + Sync` for every marker, so ids move freely between
/// workers.
///
/// # Serialization
/// Serializes as the bare ULID; the marker is skipped.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobRun {}

impl IdMarker for JobRun {
    fn prefix() -> &'static str {
        "job-"
    }
}

/// Marker for task executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskRun {}

impl IdMarker for TaskRun {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Identifier of one job invocation.
pub type JobId = Id<JobRun>;

/// Identifier of one task execution inside a job run.
pub type TaskId = Id<TaskRun>;
