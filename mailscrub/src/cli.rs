// mailscrub/src/cli.rs
//! This file defines the command-line interface (CLI) for the mailscrub application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Parser, Subcommand, ValueEnum};
use mailscrub_core::HeadlessEngineType;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "mailscrub",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Strip tracking links and tracking pixels from HTML email",
    long_about = "Mailscrub removes tracking query parameters and redirect wrappers from every link in an HTML email and deletes images that behave as open-tracking beacons. Rules are provider-specific and can be extended with a JSON rule file.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress the summary and all log output.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `mailscrub` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes an HTML file or stdin.
    #[command(about = "Sanitizes an HTML email read from a file or stdin.")]
    Sanitize(SanitizeCommand),

    /// Cleans one or more URLs and prints the results, one per line.
    #[command(name = "clean-url", about = "Cleans one or more URLs and prints the results, one per line.")]
    CleanUrl(CleanUrlCommand),
}

/// The engines selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineChoice {
    /// Parse the whole document before rewriting it.
    Buffered,
    /// Rewrite the document as it streams through.
    Streaming,
}

impl From<EngineChoice> for HeadlessEngineType {
    fn from(choice: EngineChoice) -> Self {
        match choice {
            EngineChoice::Buffered => HeadlessEngineType::Buffered,
            EngineChoice::Streaming => HeadlessEngineType::Streaming,
        }
    }
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write sanitized output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Path to a JSON rule file merged over the bundled rules.
    #[arg(long = "rules", value_name = "FILE", help = "Path to a JSON rule file merged over the bundled rules.")]
    pub rules: Option<PathBuf>,

    /// Path to a sanitizer options file (YAML).
    #[arg(long = "config", value_name = "FILE", help = "Path to a sanitizer options file (YAML).")]
    pub config: Option<PathBuf>,

    /// Select which sanitization engine to use.
    #[arg(long = "engine", value_enum, value_name = "ENGINE", default_value = "buffered", help = "Select a sanitization engine.")]
    pub engine: EngineChoice,

    #[arg(long = "no-urls", help = "Leave links untouched.")]
    pub no_urls: bool,

    #[arg(long = "no-pixels", help = "Keep all images.")]
    pub no_pixels: bool,

    #[arg(long = "body-only", help = "Emit only the body content of a full document.")]
    pub body_only: bool,

    #[arg(long = "max-pixel-size", value_name = "N", help = "Largest width/height, in pixels, that counts as a tiny image.")]
    pub max_pixel_size: Option<u32>,

    /// Extra tracking hosts, added to the configured list.
    #[arg(long = "tracking-domain", value_name = "DOMAIN", help = "Treat images from this host as tracking pixels (repeatable).")]
    pub tracking_domain: Vec<String>,

    /// Show a unified diff to highlight the changes made.
    #[arg(long, short = 'D', conflicts_with = "json_stdout", help = "Show a unified diff instead of the sanitized HTML.")]
    pub diff: bool,

    #[arg(long = "json-stdout", help = "Print the result (HTML and counters) to stdout as JSON.")]
    pub json_stdout: bool,

    /// Suppress the sanitization summary.
    #[arg(long = "no-summary", help = "Suppress the sanitization summary.")]
    pub no_summary: bool,
}

/// Arguments for the `clean-url` command.
#[derive(Parser, Debug)]
pub struct CleanUrlCommand {
    /// Path to a JSON rule file merged over the bundled rules.
    #[arg(long = "rules", value_name = "FILE", help = "Path to a JSON rule file merged over the bundled rules.")]
    pub rules: Option<PathBuf>,

    #[arg(long = "whole-url-exceptions", help = "Let an exception pattern that matches the full URL skip its provider.")]
    pub whole_url_exceptions: bool,

    #[arg(value_name = "URL", required = true, help = "The URLs to clean.")]
    pub urls: Vec<String>,
}
