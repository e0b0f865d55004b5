//! Append-only log of pull failures.

use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A newline-delimited log file. Opened, appended, and closed on every record.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, branch: &str, message: &str) -> anyhow::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file '{}'", self.path.display()))?;

        writeln!(file, "{}", format_entry(branch, message))
            .with_context(|| format!("Failed to write to log file '{}'", self.path.display()))?;

        Ok(())
    }
}

pub fn format_entry(branch: &str, message: &str) -> String {
    format!("Pull error on branch '{}': {}", branch, message)
}
