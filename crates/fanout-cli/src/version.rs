use std::fmt;

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;

pub const NAME: &str = "version";

/// Build information. Commit and date are stamped at compile time through
/// `FANOUT_GIT_COMMIT` and `FANOUT_BUILD_DATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub build_date: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("FANOUT_GIT_COMMIT").unwrap_or("unknown"),
            build_date: option_env!("FANOUT_BUILD_DATE").unwrap_or("unknown"),
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fanout {} (commit {}, built {})",
            self.version, self.commit, self.build_date
        )
    }
}

pub fn command() -> Command {
    Command::new(NAME).about("Print build information").arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as a JSON object"),
    )
}

pub fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let info = VersionInfo::current();
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{info}");
    }
    Ok(())
}
