//! Test infrastructure for git-pull-all integration tests.
#![allow(dead_code)]

use anyhow::Result;
use git_pull_all::config::{Config, Verbosity};
use git_pull_all::prompt::RetryDecision;
use git_pull_all::runner::{CommandError, CommandRunner, ProcessRunner, no_op_logger};
use git_pull_all::sync::{BranchResult, SyncCallbacks, SyncStep};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const FIXTURE_TIMEOUT: Duration = Duration::from_secs(30);

/// Config for driver tests: quiet, with the error log inside `dir`.
pub fn test_config(dir: &Path) -> Config {
    Config {
        working_dir: dir.to_path_buf(),
        command_timeout: FIXTURE_TIMEOUT,
        error_log_path: dir.join("pull_errors.log"),
        remote: "origin".to_string(),
        verbosity: Verbosity::Quiet,
    }
}

/// Lines of the pull error log, or nothing if it was never written.
pub fn log_lines(config: &Config) -> Vec<String> {
    std::fs::read_to_string(&config.error_log_path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub enum Response {
    Output(String),
    Fail(String),
    Timeout,
}

/// Scripted stand-in for git.
///
/// Responses are queued per command line. The last queued response repeats
/// once the queue drains; unscripted commands succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    responses: RefCell<HashMap<String, VecDeque<Response>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A healthy repository whose `git branch -r` prints `listing`.
    pub fn repo_with_branches(listing: &str) -> Self {
        let runner = Self::new();
        runner.output("git rev-parse --is-inside-work-tree", "true");
        runner.output("git branch -r", listing);
        runner
    }

    pub fn respond(&self, command: &str, response: Response) -> &Self {
        self.responses
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn output(&self, command: &str, output: &str) -> &Self {
        self.respond(command, Response::Output(output.to_string()))
    }

    pub fn fail(&self, command: &str, message: &str) -> &Self {
        self.respond(command, Response::Fail(message.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == command).count()
    }

    pub fn called(&self, command: &str) -> bool {
        self.count(command) > 0
    }
}

impl CommandRunner for FakeRunner {
    fn execute(&self, argv: &[&str], timeout: Duration) -> Result<String, CommandError> {
        let command = argv.join(" ");
        self.calls.borrow_mut().push(command.clone());

        let response = {
            let mut responses = self.responses.borrow_mut();
            match responses.get_mut(&command) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            None => Ok(String::new()),
            Some(Response::Output(output)) => Ok(output),
            Some(Response::Fail(message)) => Err(CommandError::failed(message)),
            Some(Response::Timeout) => Err(CommandError::TimedOut { command, timeout }),
        }
    }
}

/// A prompt that replays `answers` in order, then skips.
pub fn scripted_prompt<'a>(
    answers: &[RetryDecision],
    asked: &'a Cell<usize>,
) -> impl FnMut(&str, &CommandError) -> RetryDecision + 'a {
    let mut answers: VecDeque<RetryDecision> = answers.iter().copied().collect();
    move |_branch: &str, _error: &CommandError| {
        asked.set(asked.get() + 1);
        answers.pop_front().unwrap_or(RetryDecision::Skip)
    }
}

/// A prompt for runs that must never ask.
pub fn never_prompt(branch: &str, error: &CommandError) -> RetryDecision {
    panic!("unexpected prompt for '{}': {}", branch, error)
}

/// Records driver events as strings.
#[derive(Default)]
pub struct RecordingCallbacks {
    pub events: RefCell<Vec<String>>,
}

impl RecordingCallbacks {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn has_event(&self, prefix: &str) -> bool {
        self.events.borrow().iter().any(|e| e.starts_with(prefix))
    }
}

impl SyncCallbacks for RecordingCallbacks {
    fn on_step(&self, step: &SyncStep) {
        self.events.borrow_mut().push(format!("step: {}", step));
    }

    fn on_compare_failed(&self, branch: &str, error: &CommandError) {
        self.events
            .borrow_mut()
            .push(format!("compare failed: {}: {}", branch, error));
    }

    fn on_pull_failed(&self, branch: &str, error: &CommandError, attempt: u32) {
        self.events
            .borrow_mut()
            .push(format!("pull failed: {} #{}: {}", branch, attempt, error));
    }

    fn on_log_failed(&self, error: &anyhow::Error) {
        self.events
            .borrow_mut()
            .push(format!("log failed: {}", error));
    }

    fn on_branch_complete(&self, result: &BranchResult) {
        self.events
            .borrow_mut()
            .push(format!("complete: {} {:?}", result.branch, result.outcome));
    }
}

/// Runs git in `dir` through the real process runner.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let mut argv = vec!["git"];
    argv.extend_from_slice(args);
    Ok(ProcessRunner::new(dir, no_op_logger).execute(&argv, FIXTURE_TIMEOUT)?)
}

fn configure_identity(dir: &Path) -> Result<()> {
    run_git(dir, &["config", "user.email", "test@example.com"])?;
    run_git(dir, &["config", "user.name", "Test User"])?;
    Ok(())
}

/// A bare remote plus a seed clone used to publish commits to it.
/// Everything lives in one temporary directory, removed on drop.
pub struct TestRemote {
    temp_dir: TempDir,
    bare: PathBuf,
    seed: PathBuf,
}

impl TestRemote {
    /// Creates a remote with an initial commit on `master` and one commit on
    /// each extra branch.
    pub fn new(branches: &[&str]) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let bare = temp_dir.path().join("remote.git");
        let seed = temp_dir.path().join("seed");

        run_git(temp_dir.path(), &["init", "--bare", "-b", "master", "remote.git"])?;
        run_git(temp_dir.path(), &["init", "-b", "master", "seed"])?;
        configure_identity(&seed)?;

        std::fs::write(seed.join("README.md"), "# Test Repo\n")?;
        run_git(&seed, &["add", "README.md"])?;
        run_git(&seed, &["commit", "-m", "Initial commit"])?;
        run_git(&seed, &["remote", "add", "origin", path_str(&bare)?])?;
        run_git(&seed, &["push", "-u", "origin", "master"])?;

        let remote = Self {
            temp_dir,
            bare,
            seed,
        };
        for &branch in branches {
            run_git(&remote.seed, &["checkout", "-b", branch])?;
            remote.commit_in_seed(&format!("{}.txt", branch.replace('/', "-")))?;
            run_git(&remote.seed, &["push", "-u", "origin", branch])?;
            run_git(&remote.seed, &["checkout", "master"])?;
        }
        Ok(remote)
    }

    /// Clones the remote into a sibling directory named `name`.
    pub fn clone_into(&self, name: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        run_git(self.temp_dir.path(), &["clone", path_str(&self.bare)?, name])?;
        configure_identity(&path)?;
        Ok(path)
    }

    /// Publishes a new commit on `branch`.
    pub fn push_commit(&self, branch: &str, file: &str) -> Result<()> {
        run_git(&self.seed, &["checkout", branch])?;
        self.commit_in_seed(file)?;
        run_git(&self.seed, &["push", "origin", branch])?;
        run_git(&self.seed, &["checkout", "master"])?;
        Ok(())
    }

    /// Commit hash of `branch` on the remote.
    pub fn head_of(&self, branch: &str) -> Result<String> {
        run_git(&self.bare, &["rev-parse", branch])
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn commit_in_seed(&self, file: &str) -> Result<()> {
        std::fs::write(self.seed.join(file), format!("{}\n", file))?;
        run_git(&self.seed, &["add", file])?;
        run_git(&self.seed, &["commit", "-m", &format!("Add {}", file)])?;
        Ok(())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("non-UTF-8 path: {}", path.display()))
}
