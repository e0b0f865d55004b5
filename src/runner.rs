//! Subprocess execution with a wall-clock timeout.
//!
//! Every git call goes through the [`CommandRunner`] capability so the sync
//! driver can be exercised against scripted runners in tests.

use crate::constants::PROCESS_POLL_MS;
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure of a single command invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no command given")]
    EmptyCommand,

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. The message is what the process printed about it.
    #[error("{message}")]
    Failed { message: String },

    #[error("Command '{command}' timed out after {} seconds.", format_secs(.timeout))]
    TimedOut { command: String, timeout: Duration },

    #[error("Failed to wait for command: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Shorthand for a non-zero exit with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::TimedOut { .. })
    }
}

fn format_secs(duration: &Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:.1}", duration.as_secs_f64())
    }
}

/// Runs an external command and returns its trimmed standard output.
///
/// `argv[0]` is the program. Implementations must fail with a
/// [`CommandError`] on non-zero exit or when `timeout` elapses.
pub trait CommandRunner {
    fn execute(&self, argv: &[&str], timeout: Duration) -> Result<String, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn execute(&self, argv: &[&str], timeout: Duration) -> Result<String, CommandError> {
        (**self).execute(argv, timeout)
    }
}

/// Called with the argv of every command before it runs.
pub type CommandLogger = fn(&[&str]);

pub fn verbose_logger(argv: &[&str]) {
    eprintln!("    {}", format!("$ {}", argv.join(" ")).dimmed());
}

pub fn no_op_logger(_argv: &[&str]) {}

/// Runs commands as real child processes inside a working directory.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
    logger: CommandLogger,
}

impl ProcessRunner {
    pub fn new(working_dir: impl Into<PathBuf>, logger: CommandLogger) -> Self {
        Self {
            working_dir: working_dir.into(),
            logger,
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn execute(&self, argv: &[&str], timeout: Duration) -> Result<String, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
        (self.logger)(argv);

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Pipes are drained off-thread so a chatty process can't stall on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = wait_with_timeout(&mut child, timeout)? else {
            // Readers are left detached: a grandchild may still hold the pipes open.
            return Err(CommandError::TimedOut {
                command: argv.join(" "),
                timeout,
            });
        };

        let stdout = collect(stdout);
        if status.success() {
            return Ok(stdout.trim().to_string());
        }

        let stderr = collect(stderr);
        Err(CommandError::failed(failure_message(&stderr, &stdout, status)))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Waits for the child to exit. Returns `None` if it was killed on timeout.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(PROCESS_POLL_MS);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            // SIGKILL on Unix, TerminateProcess on Windows.
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(poll_interval);
    }
}

fn failure_message(stderr: &str, stdout: &str, status: ExitStatus) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("exited with {}", status)
}
