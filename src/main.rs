use anyhow::Context;
use clap::Parser;
use git_pull_all::cli::Cli;
use git_pull_all::output::{self, ConsoleCallbacks};
use git_pull_all::prompt::ConsolePrompt;
use git_pull_all::runner::ProcessRunner;
use git_pull_all::sync::BranchSyncDriver;

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    let working_dir = std::fs::canonicalize(&config.working_dir).with_context(|| {
        format!(
            "Failed to open working directory '{}'",
            config.working_dir.display()
        )
    })?;
    output::print_working_dir(&working_dir, &config);

    let runner = ProcessRunner::new(&working_dir, config.command_logger());
    let callbacks = ConsoleCallbacks::new(&config);
    let mut driver = BranchSyncDriver::new(config, runner, ConsolePrompt, &callbacks);

    if let Err(err) = driver.run() {
        callbacks.finish();
        output::print_fatal(&err);
        std::process::exit(err.exit_code());
    }

    Ok(())
}
