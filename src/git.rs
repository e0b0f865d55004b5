//! Git command wrappers.
//!
//! Thin typed wrappers around the git CLI calls the sync needs, plus the
//! parsers for their output. Everything runs through a [`CommandRunner`].

use crate::config::Config;
use crate::constants::SYMBOLIC_REF_MARKER;
use crate::runner::{CommandError, CommandRunner};

fn run_git(
    runner: &dyn CommandRunner,
    config: &Config,
    args: &[&str],
) -> Result<String, CommandError> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("git");
    argv.extend_from_slice(args);
    runner.execute(&argv, config.command_timeout)
}

fn validate_branch_name(branch: &str) -> Result<(), CommandError> {
    let malformed = branch.is_empty() || branch.contains('\0') || branch.contains('\n');
    if malformed || branch.starts_with('-') {
        return Err(CommandError::failed(format!(
            "Invalid branch name: {:?}",
            branch
        )));
    }
    Ok(())
}

/// Asks git whether the working directory is inside a work tree.
///
/// Any failure counts as "no".
pub fn is_inside_work_tree(runner: &dyn CommandRunner, config: &Config) -> bool {
    run_git(runner, config, &["rev-parse", "--is-inside-work-tree"])
        .map(|output| output.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn fetch_all(runner: &dyn CommandRunner, config: &Config) -> Result<(), CommandError> {
    run_git(runner, config, &["fetch", "--all"])?;
    Ok(())
}

/// Remote branch names with the configured remote prefix removed.
pub fn list_remote_branches(
    runner: &dyn CommandRunner,
    config: &Config,
) -> Result<Vec<String>, CommandError> {
    let output = run_git(runner, config, &["branch", "-r"])?;
    Ok(parse_remote_branches(&output, &config.remote))
}

pub fn list_local_branches(
    runner: &dyn CommandRunner,
    config: &Config,
) -> Result<Vec<String>, CommandError> {
    let output = run_git(runner, config, &["branch"])?;
    Ok(parse_local_branches(&output))
}

/// Number of commits on the remote-tracking ref that the local branch lacks.
pub fn count_behind(
    runner: &dyn CommandRunner,
    config: &Config,
    branch: &str,
) -> Result<u64, CommandError> {
    validate_branch_name(branch)?;
    let range = format!("{}..{}", branch, config.remote_ref(branch));
    let output = run_git(runner, config, &["rev-list", "--count", &range])?;
    parse_count(&output)
}

pub fn checkout(
    runner: &dyn CommandRunner,
    config: &Config,
    branch: &str,
) -> Result<(), CommandError> {
    validate_branch_name(branch)?;
    run_git(runner, config, &["checkout", branch])?;
    Ok(())
}

pub fn pull(runner: &dyn CommandRunner, config: &Config) -> Result<(), CommandError> {
    run_git(runner, config, &["pull"])?;
    Ok(())
}

/// Parses `git branch -r` output.
///
/// Symbolic refs (`origin/HEAD -> origin/main`) are dropped and the
/// `<remote>/` prefix is stripped; names from other remotes pass through.
pub fn parse_remote_branches(output: &str, remote: &str) -> Vec<String> {
    let prefix = format!("{}/", remote);
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(SYMBOLIC_REF_MARKER))
        .map(|line| match line.strip_prefix(&prefix) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => line.to_string(),
        })
        .collect()
}

/// Parses `git branch` output, dropping the `*` on the current branch.
pub fn parse_local_branches(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_count(output: &str) -> Result<u64, CommandError> {
    output.trim().parse::<u64>().map_err(|_| {
        CommandError::failed(format!("unexpected commit count {:?}", output.trim()))
    })
}
