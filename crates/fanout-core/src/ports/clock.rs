//! Clock port.
//!
//! Id generation reads the time through this trait so tests can pin it.
//!
//! # Implementations
//! - [`SystemClock`]: wall clock, used in production
//! - [`FixedClock`]: frozen instant, used in tests

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// # Thread Safety
/// Requires `Send + Sync`: one clock is shared by every worker through the
/// id generator.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
///
/// Every call to [`Clock::now`] returns the same value, so ULIDs minted
/// through it share their timestamp part and differ only in randomness.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
