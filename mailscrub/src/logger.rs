// mailscrub/src/logger.rs
//! Logger initialization for the CLI.
//!
//! `RUST_LOG` is honoured when no explicit level is requested; otherwise the
//! level given on the command line wins. Log output always goes to stderr so
//! it never mixes with sanitized HTML on stdout.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Default filter when neither a flag nor `RUST_LOG` asks for anything else.
pub const DEFAULT_FILTER: &str = "warn";

/// Initializes the global logger. Calling it more than once is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    // html5ever is chatty about recoverable parse errors in real-world mail.
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.format_timestamp(None).target(Target::Stderr);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized; keeping the existing one.");
    }
}

/// Maps the global `--quiet` / `--debug` flags to a level override.
pub fn level_for(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(level_for(true, false), Some(LevelFilter::Off));
        assert_eq!(level_for(false, true), Some(LevelFilter::Debug));
        assert_eq!(level_for(false, false), None);
    }

    #[test]
    fn repeated_initialization_does_not_panic() {
        init_logger(Some(LevelFilter::Off));
        init_logger(None);
    }
}
