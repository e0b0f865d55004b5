//! Command-line arguments.

use crate::config::{Config, Verbosity};
use crate::constants::{DEFAULT_LOG_FILE, DEFAULT_REMOTE, DEFAULT_WORKING_DIR, git_timeout};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Check out every remote branch and pull the ones that are behind.
#[derive(Debug, Parser)]
#[command(name = "git-pull-all", version, about)]
pub struct Cli {
    /// Repository to sync
    #[arg(short = 'C', long = "dir", value_name = "PATH", default_value = DEFAULT_WORKING_DIR)]
    pub working_dir: PathBuf,

    /// Timeout for each git command, in seconds [default: $GIT_PULL_ALL_TIMEOUT or 10]
    #[arg(short, long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// File that pull failures are appended to
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Remote whose branches are synced
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Only print failures and prompts
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every step and git command
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn into_config(self) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Config {
            working_dir: self.working_dir,
            command_timeout: self
                .timeout
                .map(Duration::from_secs)
                .unwrap_or_else(git_timeout),
            error_log_path: self.log_file,
            remote: self.remote,
            verbosity,
        }
    }
}
