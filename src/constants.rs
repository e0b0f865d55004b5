//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

use std::time::Duration;

/// Default timeout for individual git operations (in seconds).
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 10;

/// Environment variable that overrides the git command timeout (in seconds).
pub const TIMEOUT_ENV_VAR: &str = "GIT_PULL_ALL_TIMEOUT";

/// Returns the git command timeout.
///
/// Can be customized via the GIT_PULL_ALL_TIMEOUT environment variable (in seconds).
/// Falls back to 10 seconds if not set or invalid.
///
/// Example: `GIT_PULL_ALL_TIMEOUT=60 git-pull-all`
pub fn git_timeout() -> Duration {
    parse_timeout(std::env::var(TIMEOUT_ENV_VAR).ok().as_deref())
}

fn parse_timeout(value: Option<&str>) -> Duration {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS))
}

/// Default location of the repository to sync.
pub const DEFAULT_WORKING_DIR: &str = ".";

/// Default pull error log, relative to the process working directory.
pub const DEFAULT_LOG_FILE: &str = "pull_errors.log";

/// Remote whose branches are enumerated and compared against.
pub const DEFAULT_REMOTE: &str = "origin";

/// Marks a symbolic ref line in `git branch -r` output (`origin/HEAD -> origin/main`).
pub const SYMBOLIC_REF_MARKER: &str = "->";

/// Prefix on the log message of a failed retry.
pub const RETRY_LOG_PREFIX: &str = "Retry: ";

/// Interval between checks on a running git process.
pub const PROCESS_POLL_MS: u64 = 20;

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;
