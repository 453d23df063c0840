mod config;
mod jobs;
mod logging;
mod shutdown;
mod version;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches};
use fanout_core::{CommandBuilder, JobCommand, RunContext, after_job_hook, before_job_hook};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let registry = jobs::registry().context("failed to register jobs")?;

    let mut run_job = CommandBuilder::new(registry)
        .with_cancellation_token(cancel.clone())
        .with_before_job(before_job_hook(|ctx: RunContext| async move {
            if ctx.is_cancelled() {
                anyhow::bail!("shutdown requested before {} started", ctx.job_name());
            }
            tracing::info!("starting job");
            Ok(())
        }))
        .with_after_job(after_job_hook(|ctx: RunContext| async move {
            if ctx.is_cancelled() {
                tracing::warn!("job was cancelled, some tasks may have stopped early");
            }
        }))
        .build();

    let matches = Cli::command()
        .subcommand(version::command())
        .subcommand(run_job.command())
        .subcommand_required(true)
        .get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    logging::init(&cli.global)?;
    shutdown::cancel_on_signal(cancel);

    match matches.subcommand() {
        Some((version::NAME, sub)) => version::run(sub),
        Some((JobCommand::NAME, sub)) => {
            run_job.execute(sub).await?;
            Ok(())
        }
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    }
}

