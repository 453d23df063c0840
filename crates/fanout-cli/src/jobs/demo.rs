//! `demo`: a synthetic job with tunable latency, failures and panics.
//!
//! Every task sleeps for a random delay and then fails with probability
//! `--fail-rate`. Failed attempts are retried with backoff up to
//! `--attempts` times. `--panic-rate` makes a task panic outright, which the
//! pool records as a failure. `--dry-run` only logs what would be done.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use fanout_core::{Job, Metadata, RunContext, Task, TaskError};
use rand::Rng;

use super::backoff::retry_with_backoff;

const BASE_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub tasks: usize,
    pub workers: usize,
    pub fail_rate: f64,
    pub panic_rate: f64,
    pub max_delay_ms: u64,
    pub attempts: u32,
    pub dry_run: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tasks: 10,
            workers: 4,
            fail_rate: 0.1,
            panic_rate: 0.0,
            max_delay_ms: 200,
            attempts: 3,
            dry_run: false,
        }
    }
}

impl DemoConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.fail_rate) {
            anyhow::bail!("--fail-rate must be between 0 and 1 (got {})", self.fail_rate);
        }
        if !(0.0..=1.0).contains(&self.panic_rate) {
            anyhow::bail!(
                "--panic-rate must be between 0 and 1 (got {})",
                self.panic_rate
            );
        }
        if self.attempts == 0 {
            anyhow::bail!("--attempts must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DemoJob {
    config: DemoConfig,
}

impl DemoJob {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }
}

impl Job for DemoJob {
    fn metadata(&self) -> Metadata {
        Metadata::new(
            "demo",
            "Run synthetic tasks with random latency, failures and panics",
        )
    }

    fn add_flags(&self, cmd: Command) -> Command {
        let defaults = DemoConfig::default();
        cmd.arg(
            Arg::new("tasks")
                .long("tasks")
                .env("FANOUT_DEMO_TASKS")
                .value_parser(value_parser!(usize))
                .default_value(defaults.tasks.to_string())
                .help("Number of tasks to produce"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .short('w')
                .env("FANOUT_DEMO_WORKERS")
                .value_parser(value_parser!(usize))
                .default_value(defaults.workers.to_string())
                .help("Number of concurrent workers"),
        )
        .arg(
            Arg::new("fail-rate")
                .long("fail-rate")
                .env("FANOUT_DEMO_FAIL_RATE")
                .value_parser(value_parser!(f64))
                .default_value(defaults.fail_rate.to_string())
                .help("Probability in [0, 1] that an attempt fails"),
        )
        .arg(
            Arg::new("panic-rate")
                .long("panic-rate")
                .env("FANOUT_DEMO_PANIC_RATE")
                .value_parser(value_parser!(f64))
                .default_value(defaults.panic_rate.to_string())
                .help("Probability in [0, 1] that a task panics"),
        )
        .arg(
            Arg::new("max-delay-ms")
                .long("max-delay-ms")
                .env("FANOUT_DEMO_MAX_DELAY_MS")
                .value_parser(value_parser!(u64))
                .default_value(defaults.max_delay_ms.to_string())
                .help("Upper bound of the simulated work per attempt"),
        )
        .arg(
            Arg::new("attempts")
                .long("attempts")
                .env("FANOUT_DEMO_ATTEMPTS")
                .value_parser(value_parser!(u32))
                .default_value(defaults.attempts.to_string())
                .help("Attempts per task before giving up"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .env("FANOUT_DEMO_DRY_RUN")
                .action(ArgAction::SetTrue)
                .help("Log what would be done without doing it"),
        )
    }

    fn apply_flags(&mut self, matches: &ArgMatches) -> anyhow::Result<()> {
        let defaults = DemoConfig::default();
        self.config = DemoConfig {
            tasks: matches.get_one("tasks").copied().unwrap_or(defaults.tasks),
            workers: matches.get_one("workers").copied().unwrap_or(defaults.workers),
            fail_rate: matches
                .get_one("fail-rate")
                .copied()
                .unwrap_or(defaults.fail_rate),
            panic_rate: matches
                .get_one("panic-rate")
                .copied()
                .unwrap_or(defaults.panic_rate),
            max_delay_ms: matches
                .get_one("max-delay-ms")
                .copied()
                .unwrap_or(defaults.max_delay_ms),
            attempts: matches
                .get_one("attempts")
                .copied()
                .unwrap_or(defaults.attempts),
            dry_run: matches.get_flag("dry-run"),
        };
        Ok(())
    }

    fn tasks(&self) -> anyhow::Result<Vec<Box<dyn Task>>> {
        self.config.validate().context("invalid demo configuration")?;

        Ok((0..self.config.tasks)
            .map(|index| {
                Box::new(DemoTask {
                    name: format!("demo-{index:04}"),
                    config: self.config.clone(),
                }) as Box<dyn Task>
            })
            .collect())
    }

    fn worker_count(&self) -> usize {
        self.config.workers
    }
}

struct DemoTask {
    name: String,
    config: DemoConfig,
}

impl DemoTask {
    async fn attempt(&self, ctx: &RunContext, attempt: u32) -> anyhow::Result<()> {
        // ThreadRng is not Send; draw everything before the first await.
        let (delay, fails) = {
            let mut rng = rand::thread_rng();
            (
                Duration::from_millis(rng.gen_range(0..=self.config.max_delay_ms)),
                rng.gen_bool(self.config.fail_rate),
            )
        };

        tokio::select! {
            _ = ctx.cancelled() => anyhow::bail!("cancelled during attempt {attempt}"),
            _ = tokio::time::sleep(delay) => {}
        }

        if fails {
            anyhow::bail!("simulated failure on attempt {attempt}");
        }
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "attempt succeeded");
        Ok(())
    }
}

#[async_trait]
impl Task for DemoTask {
    fn task_name(&self) -> &str {
        &self.name
    }

    async fn process(&self, ctx: &RunContext) -> Result<(), TaskError> {
        if self.config.dry_run {
            tracing::info!(
                attempts = self.config.attempts,
                max_delay_ms = self.config.max_delay_ms,
                "dry run, skipping work"
            );
            return Ok(());
        }

        if rand::random::<f64>() < self.config.panic_rate {
            panic!("simulated panic in {}", self.name);
        }

        retry_with_backoff(ctx, self.config.attempts, BASE_BACKOFF, |attempt| {
            self.attempt(ctx, attempt)
        })
        .await
    }
}
