//! Ports: seams the runtime reads time and identifiers through.
//!
//! The runner and the worker pool never call `Utc::now()` or mint ULIDs
//! directly. They go through the traits here so tests can swap in fixed
//! implementations.
//!
//! # Implementations
//! - [`SystemClock`] and [`UlidGenerator`]: production defaults
//! - [`FixedClock`]: pins time for deterministic id timestamps

pub mod clock;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};

use std::sync::Arc;

/// Generator used when none is injected: ULIDs stamped by the wall clock.
pub fn default_id_generator() -> Arc<dyn IdGenerator> {
    Arc::new(UlidGenerator::new(SystemClock))
}
