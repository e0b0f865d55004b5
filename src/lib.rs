//! Remote branch puller.
//!
//! This crate syncs every remote branch of a git repository by:
//! - Fetching all remotes
//! - Checking out each remote branch locally
//! - Pulling the branches that are behind their remote
//! - Logging failed pulls and asking the operator whether to retry

pub mod cli;
pub mod config;
pub mod constants;
pub mod error_log;
pub mod git;
pub mod output;
pub mod prompt;
pub mod runner;
pub mod sync;
