use clap::{Args, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Log output format (logs always go to stderr)
    #[arg(
        long,
        global = true,
        value_enum,
        env = "FANOUT_LOG_FORMAT",
        default_value = "text"
    )]
    pub log_format: LogFormat,

    /// Log filter in tracing's EnvFilter syntax; RUST_LOG wins when set
    #[arg(long, global = true, env = "FANOUT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Root command. Subcommands are attached at runtime since jobs come from the
/// registry.
#[derive(Debug, Parser)]
#[command(name = "fanout")]
#[command(version)]
#[command(about = "Run registered jobs across a fixed pool of workers")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
}
