//! Spinner, colored status lines, and fatal error reporting.
//!
//! This module turns driver events into console feedback at the configured
//! verbosity.

use crate::config::Config;
use crate::constants::PROGRESS_TICK_MS;
use crate::runner::CommandError;
use crate::sync::{BranchOutcome, BranchResult, SyncCallbacks, SyncError, SyncStep};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::error::Error;
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
/// This is the null object pattern for SyncCallbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl SyncCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &SyncStep) {}
    fn on_branch_complete(&self, _result: &BranchResult) {}
}

/// Console feedback for a sync run.
///
/// Normal mode shows a spinner per step, verbose mode prints every step as a
/// line, quiet mode prints only failures.
pub struct ConsoleCallbacks {
    config: Config,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleCallbacks {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            spinner: RefCell::new(None),
        }
    }

    /// Stops any running spinner. Call before printing outside the callbacks.
    pub fn finish(&self) {
        self.clear_spinner();
    }

    fn show_spinner(&self, message: String) {
        let mut slot = self.spinner.borrow_mut();
        let spinner = slot.get_or_insert_with(create_spinner);
        spinner.set_message(message);
    }

    fn clear_spinner(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }

    /// Prints a line without tearing the spinner.
    fn print_line(&self, line: String) {
        match self.spinner.borrow().as_ref() {
            Some(spinner) => spinner.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }
}

impl SyncCallbacks for ConsoleCallbacks {
    fn on_step(&self, step: &SyncStep) {
        if self.config.is_quiet() {
            return;
        }
        if *step == SyncStep::Completed {
            self.clear_spinner();
            println!("\n{}", "All branches processed.".green().bold());
            return;
        }
        if self.config.is_verbose() {
            eprintln!("  {}...", step.to_string().dimmed());
        } else {
            self.show_spinner(format!("{}...", step));
        }
    }

    fn on_branches_found(&self, branches: &[String]) {
        self.clear_spinner();
        if self.config.is_quiet() {
            return;
        }
        if branches.is_empty() {
            println!("{}", "No remote branches found.".yellow().bold());
        } else {
            println!(
                "{}",
                format!("Found {} remote branches", branches.len()).dimmed()
            );
        }
    }

    fn on_branch_start(&self, branch: &str) {
        if self.config.is_quiet() {
            return;
        }
        println!(
            "\n{}",
            format!("Processing branch '{}':", branch).white().bold()
        );
    }

    fn on_compare_failed(&self, branch: &str, error: &CommandError) {
        if self.config.is_quiet() {
            return;
        }
        self.print_line(format!(
            "  {} Could not compare branch '{}' with remote: {}",
            "!".yellow(),
            branch,
            error
        ));
    }

    fn on_pull_failed(&self, branch: &str, error: &CommandError, attempt: u32) {
        // The operator is about to be prompted; the spinner must not draw over it.
        self.clear_spinner();
        let label = if attempt > 1 {
            "Retry failed".to_string()
        } else {
            format!("Error pulling branch '{}'", branch)
        };
        println!("  {} {}: {}", "✗".red(), label, error.to_string().red());
    }

    fn on_log_failed(&self, error: &anyhow::Error) {
        self.clear_spinner();
        eprintln!("{} {:#}", "Error logging pull error:".red(), error);
    }

    fn on_branch_complete(&self, result: &BranchResult) {
        self.clear_spinner();
        let failed = matches!(result.outcome, BranchOutcome::CheckoutFailed { .. });
        if self.config.is_quiet() && !failed {
            return;
        }
        println!("{}", format_outcome(result));
    }
}

fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("  {spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
    spinner
}

fn format_outcome(result: &BranchResult) -> String {
    let elapsed = format_duration(result.duration).dimmed();
    match &result.outcome {
        BranchOutcome::UpToDate => format!(
            "  {} Branch is already up to date. Skipping pull. {}",
            "✓".green(),
            elapsed
        ),
        BranchOutcome::Pulled { attempts: 1 } => {
            format!("  {} Pulled latest changes. {}", "✓".green(), elapsed)
        }
        BranchOutcome::Pulled { attempts } => format!(
            "  {} Pull succeeded after {} attempts. {}",
            "✓".green(),
            attempts,
            elapsed
        ),
        BranchOutcome::PullSkipped { .. } => format!(
            "  {} Skipping pull for branch '{}'.",
            "-".yellow(),
            result.branch
        ),
        BranchOutcome::CheckoutFailed { error } => format!(
            "  {} Error checking out branch '{}': {}",
            "✗".red(),
            result.branch,
            error
        ),
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

pub fn print_working_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Working in:".cyan(),
        path.display().to_string().white().bold()
    )
}

/// Prints a run-ending error and the git message behind it, if any.
pub fn print_fatal(error: &SyncError) {
    eprintln!("{}", error.to_string().red().bold());
    if let Some(source) = error.source() {
        eprintln!("  {}", source.to_string().dimmed());
    }
}
