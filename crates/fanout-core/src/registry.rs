use crate::error::RegistryError;
use crate::job::Job;

/// Registry of runnable jobs, keyed by their CLI name.
///
/// Built by the entry point during start-up and then handed to the
/// [`CommandBuilder`](crate::command::CommandBuilder). Registration order is
/// kept so the CLI lists jobs the way they were added.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<Box<dyn Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn add_job(&mut self, job: Box<dyn Job>) -> Result<(), RegistryError> {
        let name = job.metadata().name;
        if self.get(&name).is_some() {
            return Err(RegistryError::DuplicateJob(name));
        }
        self.jobs.push(job);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Job> {
        self.jobs
            .iter()
            .find(|job| job.metadata().name == name)
            .map(|job| &**job as &dyn Job)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Job>> {
        self.jobs.iter_mut().find(|job| job.metadata().name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.jobs.iter().map(|job| job.metadata().name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Job> {
        self.jobs.iter().map(|job| &**job as &dyn Job)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
