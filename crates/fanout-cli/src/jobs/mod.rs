//! Jobs shipped with the `fanout` binary.

pub mod backoff;
pub mod demo;

use fanout_core::{JobRegistry, RegistryError};

pub use self::demo::{DemoConfig, DemoJob};

/// Registry holding every built-in job.
pub fn registry() -> Result<JobRegistry, RegistryError> {
    let mut registry = JobRegistry::new();
    registry.add_job(Box::new(DemoJob::new(DemoConfig::default())))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_jobs_are_registered() {
        let registry = registry().unwrap();
        assert_eq!(registry.names(), vec!["demo"]);
    }
}
