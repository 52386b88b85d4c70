// mailscrub/src/lib.rs
//! # MailScrub CLI Application
//!
//! This crate provides the command-line interface for the `mailscrub-core`
//! engine: argument parsing, logger setup, the `sanitize` and `clean-url`
//! commands, and terminal output.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

use anyhow::Result;

use crate::cli::{Cli, Commands};

/// Dispatches a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Sanitize(cmd) => commands::sanitize::run_sanitize(cmd, cli.quiet),
        Commands::CleanUrl(cmd) => commands::clean_url::run_clean_url(cmd),
    }
}
