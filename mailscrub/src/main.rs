// mailscrub/src/main.rs
//! MailScrub entry point.
//!
//! Parses the command line, initializes logging and runs the selected command.

use anyhow::Result;
use clap::Parser;
use mailscrub::cli::Cli;
use mailscrub::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(logger::level_for(cli.quiet, cli.debug));
    mailscrub::run(cli)
}
