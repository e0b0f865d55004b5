//! Operator decisions after a failed pull.
//!
//! The driver only sees [`RetryPrompt`]; the console, piped stdin, or a test
//! closure can stand behind it.

use crate::runner::CommandError;
use dialoguer::Input;
use std::io::{BufRead, IsTerminal, Write};

const GUIDANCE: &str = "  Please enter 'y' (yes) or 'n' (no).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Skip,
}

/// Decides what to do with a branch whose pull just failed.
pub trait RetryPrompt {
    fn decide(&mut self, branch: &str, error: &CommandError) -> RetryDecision;
}

impl<F> RetryPrompt for F
where
    F: FnMut(&str, &CommandError) -> RetryDecision,
{
    fn decide(&mut self, branch: &str, error: &CommandError) -> RetryDecision {
        self(branch, error)
    }
}

/// Maps a typed answer to a decision: `y` or `n`, any case, surrounding
/// whitespace ignored.
pub fn parse_answer(input: &str) -> Option<RetryDecision> {
    match input.trim().to_lowercase().as_str() {
        "y" => Some(RetryDecision::Retry),
        "n" => Some(RetryDecision::Skip),
        _ => None,
    }
}

fn question(branch: &str) -> String {
    format!("Pull error on branch '{}'. Try again? (y/n)", branch)
}

/// Line-oriented prompt over any reader and writer.
///
/// Re-asks until it gets `y` or `n`. End of input means skip.
pub struct ReaderPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ReaderPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, branch: &str) -> std::io::Result<RetryDecision> {
        loop {
            write!(self.output, "{}: ", question(branch))?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(RetryDecision::Skip);
            }
            match parse_answer(&line) {
                Some(decision) => return Ok(decision),
                None => writeln!(self.output, "{}", GUIDANCE)?,
            }
        }
    }
}

impl<R: BufRead, W: Write> RetryPrompt for ReaderPrompt<R, W> {
    fn decide(&mut self, branch: &str, _error: &CommandError) -> RetryDecision {
        self.ask(branch).unwrap_or(RetryDecision::Skip)
    }
}

/// Prompt on the process's own terminal.
///
/// Uses an interactive `dialoguer` input on a TTY and falls back to reading
/// lines from stdin when answers are piped in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl RetryPrompt for ConsolePrompt {
    fn decide(&mut self, branch: &str, error: &CommandError) -> RetryDecision {
        if !std::io::stdin().is_terminal() {
            let stdin = std::io::stdin();
            return ReaderPrompt::new(stdin.lock(), std::io::stdout()).decide(branch, error);
        }

        loop {
            let answer = Input::<String>::new()
                .with_prompt(question(branch))
                .allow_empty(true)
                .interact_text();
            match answer {
                Ok(answer) => match parse_answer(&answer) {
                    Some(decision) => return decision,
                    None => println!("{}", GUIDANCE),
                },
                Err(_) => return RetryDecision::Skip,
            }
        }
    }
}
