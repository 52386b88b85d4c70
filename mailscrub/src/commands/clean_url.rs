// mailscrub/src/commands/clean_url.rs
//! `clean-url` command: cleans URLs given on the command line.

use anyhow::{bail, Result};
use is_terminal::IsTerminal;
use log::debug;
use std::io::{self, Write};

use mailscrub_core::{merge_rule_sets, ExceptionPolicy, LinkCleaner, RuleSet};

use crate::cli::CleanUrlCommand;
use crate::commands::load_user_rules;
use crate::ui::output_format;

/// Runs the `clean-url` command. Every URL is attempted; the command fails
/// afterwards if any of them could not be parsed.
pub fn run_clean_url(cmd: &CleanUrlCommand) -> Result<()> {
    let mut stderr = io::stderr();
    let stderr_color = stderr.is_terminal();

    let cleaner = match load_user_rules(cmd.rules.as_deref(), &mut stderr, stderr_color)? {
        Some(user) => LinkCleaner::new(&merge_rule_sets(RuleSet::load_default_rules()?, Some(user))),
        None => LinkCleaner::with_default_rules(),
    };
    let cleaner = if cmd.whole_url_exceptions {
        cleaner.with_exception_policy(ExceptionPolicy::WholeUrl)
    } else {
        cleaner
    };

    let mut stdout = io::stdout().lock();
    let mut failed = 0usize;

    for url in &cmd.urls {
        match cleaner.clean(url) {
            Ok(cleaned) => {
                debug!("Cleaned '{}' -> '{}'", url, cleaned);
                writeln!(stdout, "{}", cleaned)?;
            }
            Err(e) => {
                failed += 1;
                output_format::print_error_message(&mut stderr, &e.to_string(), stderr_color)?;
            }
        }
    }
    stdout.flush()?;

    if failed > 0 {
        bail!("{} of {} URL(s) could not be cleaned", failed, cmd.urls.len());
    }
    Ok(())
}
