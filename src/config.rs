//! Configuration types for the branch sync run.

use crate::constants::{DEFAULT_LOG_FILE, DEFAULT_REMOTE, DEFAULT_WORKING_DIR, git_timeout};
use crate::runner::{self, CommandLogger};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration passed into the driver at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the repository whose branches are synced.
    pub working_dir: PathBuf,
    /// Wall-clock limit for every git invocation.
    pub command_timeout: Duration,
    /// Destination of pull failure records.
    pub error_log_path: PathBuf,
    /// Remote whose branches are enumerated.
    pub remote: String,
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            command_timeout: git_timeout(),
            error_log_path: PathBuf::from(DEFAULT_LOG_FILE),
            remote: DEFAULT_REMOTE.to_string(),
            verbosity: Verbosity::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Remote-tracking ref for a local branch, e.g. `origin/feature`.
    #[must_use]
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }

    /// Returns the command logger matching the verbosity settings.
    ///
    /// Config only picks which logger to use; the loggers themselves live
    /// next to the runner that calls them.
    #[must_use]
    pub fn command_logger(&self) -> CommandLogger {
        if self.is_verbose() {
            runner::verbose_logger
        } else {
            runner::no_op_logger
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}
