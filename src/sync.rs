//! Branch sync driver, steps, and per-branch outcomes.

use crate::config::Config;
use crate::constants::RETRY_LOG_PREFIX;
use crate::error_log::ErrorLog;
use crate::git;
use crate::prompt::{RetryDecision, RetryPrompt};
use crate::runner::{CommandError, CommandRunner};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    CheckingRepository,
    Fetching,
    ListingBranches,
    /// `existing` is `None` when the local branch list could not be read.
    CheckingOut {
        branch: String,
        existing: Option<bool>,
    },
    Comparing {
        branch: String,
    },
    Pulling {
        branch: String,
    },
    RetryingPull {
        branch: String,
        attempt: u32,
    },
    Completed,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStep::CheckingRepository => write!(f, "Checking repository"),
            SyncStep::Fetching => write!(f, "Fetching all remote branches"),
            SyncStep::ListingBranches => write!(f, "Listing remote branches"),
            SyncStep::CheckingOut {
                branch,
                existing: Some(false),
            } => write!(f, "Creating local branch '{}' from remote", branch),
            SyncStep::CheckingOut { branch, .. } => write!(f, "Checking out '{}'", branch),
            SyncStep::Comparing { branch } => write!(f, "Comparing '{}' with remote", branch),
            SyncStep::Pulling { branch } => write!(f, "Pulling latest changes into '{}'", branch),
            SyncStep::RetryingPull { branch, attempt } => {
                write!(f, "Retrying pull of '{}' (attempt {})", branch, attempt)
            }
            SyncStep::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    UpToDate,
    /// Pulled after `attempts` tries (1 when the first pull worked).
    Pulled {
        attempts: u32,
    },
    /// The operator gave up after `attempts` failed pulls.
    PullSkipped {
        attempts: u32,
    },
    CheckoutFailed {
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct BranchResult {
    pub branch: String,
    pub outcome: BranchOutcome,
    pub duration: Duration,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub results: Vec<BranchResult>,
}

impl SyncReport {
    pub fn outcome(&self, branch: &str) -> Option<&BranchOutcome> {
        self.results
            .iter()
            .find(|r| r.branch == branch)
            .map(|r| &r.outcome)
    }
}

/// Conditions that end the whole run before any branch is touched.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Error: This directory is not a Git repository.")]
    NotARepository,

    #[error("Failed to fetch remote branches. Exiting.")]
    FetchFailed(#[source] CommandError),

    #[error("Failed to retrieve remote branches.")]
    ListBranchesFailed(#[source] CommandError),
}

impl SyncError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::NotARepository
            | SyncError::FetchFailed(_)
            | SyncError::ListBranchesFailed(_) => 1,
        }
    }
}

/// Observer for driver progress. Only `on_step` and `on_branch_complete`
/// are required.
pub trait SyncCallbacks {
    fn on_step(&self, step: &SyncStep);

    fn on_branches_found(&self, _branches: &[String]) {}

    fn on_branch_start(&self, _branch: &str) {}

    /// The behind-count query failed; a pull will be attempted anyway.
    fn on_compare_failed(&self, _branch: &str, _error: &CommandError) {}

    fn on_pull_failed(&self, _branch: &str, _error: &CommandError, _attempt: u32) {}

    fn on_log_failed(&self, _error: &anyhow::Error) {}

    fn on_branch_complete(&self, result: &BranchResult);
}

/// Walks every remote branch, checks it out, and pulls it when behind.
pub struct BranchSyncDriver<'a, R, P> {
    config: Config,
    runner: R,
    prompt: P,
    error_log: ErrorLog,
    callbacks: &'a dyn SyncCallbacks,
}

impl<'a, R, P> BranchSyncDriver<'a, R, P>
where
    R: CommandRunner,
    P: RetryPrompt,
{
    pub fn new(config: Config, runner: R, prompt: P, callbacks: &'a dyn SyncCallbacks) -> Self {
        let error_log = ErrorLog::new(&config.error_log_path);
        Self {
            config,
            runner,
            prompt,
            error_log,
            callbacks,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&mut self) -> Result<SyncReport, SyncError> {
        self.callbacks.on_step(&SyncStep::CheckingRepository);
        if !git::is_inside_work_tree(&self.runner, &self.config) {
            return Err(SyncError::NotARepository);
        }

        self.callbacks.on_step(&SyncStep::Fetching);
        git::fetch_all(&self.runner, &self.config).map_err(SyncError::FetchFailed)?;

        self.callbacks.on_step(&SyncStep::ListingBranches);
        let branches = git::list_remote_branches(&self.runner, &self.config)
            .map_err(SyncError::ListBranchesFailed)?;
        self.callbacks.on_branches_found(&branches);

        if branches.is_empty() {
            return Ok(SyncReport::default());
        }

        let local = git::list_local_branches(&self.runner, &self.config).ok();

        let mut report = SyncReport {
            results: Vec::with_capacity(branches.len()),
        };
        for branch in &branches {
            let start = Instant::now();
            self.callbacks.on_branch_start(branch);

            let outcome = self.sync_branch(branch, local.as_deref());
            let result = BranchResult {
                branch: branch.clone(),
                outcome,
                duration: start.elapsed(),
            };

            self.callbacks.on_branch_complete(&result);
            report.results.push(result);
        }

        self.callbacks.on_step(&SyncStep::Completed);
        Ok(report)
    }

    fn sync_branch(&mut self, branch: &str, local: Option<&[String]>) -> BranchOutcome {
        self.callbacks.on_step(&SyncStep::CheckingOut {
            branch: branch.to_string(),
            existing: local.map(|names| names.iter().any(|name| name == branch)),
        });
        if let Err(error) = git::checkout(&self.runner, &self.config, branch) {
            return BranchOutcome::CheckoutFailed {
                error: error.to_string(),
            };
        }

        if !self.needs_pull(branch) {
            return BranchOutcome::UpToDate;
        }

        self.pull_with_retry(branch)
    }

    /// Fails open: if the comparison can't be made, assume a pull is needed.
    fn needs_pull(&self, branch: &str) -> bool {
        self.callbacks.on_step(&SyncStep::Comparing {
            branch: branch.to_string(),
        });
        match git::count_behind(&self.runner, &self.config, branch) {
            Ok(behind) => behind > 0,
            Err(error) => {
                self.callbacks.on_compare_failed(branch, &error);
                true
            }
        }
    }

    fn pull_with_retry(&mut self, branch: &str) -> BranchOutcome {
        self.callbacks.on_step(&SyncStep::Pulling {
            branch: branch.to_string(),
        });

        let mut attempts = 1;
        let mut error = match git::pull(&self.runner, &self.config) {
            Ok(()) => return BranchOutcome::Pulled { attempts },
            Err(error) => error,
        };
        self.callbacks.on_pull_failed(branch, &error, attempts);
        self.log_failure(branch, &error.to_string());

        loop {
            match self.prompt.decide(branch, &error) {
                RetryDecision::Skip => return BranchOutcome::PullSkipped { attempts },
                RetryDecision::Retry => {
                    attempts += 1;
                    self.callbacks.on_step(&SyncStep::RetryingPull {
                        branch: branch.to_string(),
                        attempt: attempts,
                    });
                    match git::pull(&self.runner, &self.config) {
                        Ok(()) => return BranchOutcome::Pulled { attempts },
                        Err(retry_error) => {
                            self.callbacks.on_pull_failed(branch, &retry_error, attempts);
                            self.log_failure(
                                branch,
                                &format!("{}{}", RETRY_LOG_PREFIX, retry_error),
                            );
                            error = retry_error;
                        }
                    }
                }
            }
        }
    }

    fn log_failure(&self, branch: &str, message: &str) {
        if let Err(err) = self.error_log.record(branch, message) {
            self.callbacks.on_log_failed(&err);
        }
    }
}
