// mailscrub/src/commands/sanitize.rs
//! `sanitize` command: cleans an HTML email read from a file or stdin.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use mailscrub_core::{build_engine, SanitizationResult, SanitizerOptions};

use crate::cli::SanitizeCommand;
use crate::commands::load_user_rules;
use crate::ui::{diff_viewer, output_format, summary};

/// Builds the sanitizer options from `--config` and the individual flags.
/// Flags win over the file.
pub fn build_sanitizer_options(cmd: &SanitizeCommand) -> Result<SanitizerOptions> {
    let mut options = match &cmd.config {
        Some(path) => SanitizerOptions::load_from_file(path)?,
        None => SanitizerOptions::default(),
    };

    if cmd.no_urls {
        options.clean_urls = false;
    }
    if cmd.no_pixels {
        options.remove_tracking_pixels = false;
    }
    if cmd.body_only {
        options.preserve_document_structure = false;
    }
    if let Some(size) = cmd.max_pixel_size {
        options.tracking_pixels.max_pixel_size = size;
    }
    for domain in &cmd.tracking_domain {
        let domain = domain.trim().to_ascii_lowercase();
        if !domain.is_empty() && !options.tracking_pixels.tracking_domains.contains(&domain) {
            options.tracking_pixels.tracking_domains.push(domain);
        }
    }

    debug!("Effective sanitizer options: {:?}", options);
    Ok(options)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            info!("Reading input from file: {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))
        }
        None => {
            info!("Reading input from stdin.");
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Runs the `sanitize` command.
pub fn run_sanitize(cmd: &SanitizeCommand, quiet: bool) -> Result<()> {
    info!("Starting sanitize operation.");

    let options = build_sanitizer_options(cmd)?;
    let mut stderr = io::stderr();
    let stderr_color = stderr.is_terminal();
    let user_rules = load_user_rules(cmd.rules.as_deref(), &mut stderr, stderr_color)?;
    let input = read_input(cmd.input_file.as_deref())?;

    let engine = build_engine(options, user_rules, cmd.engine.into());
    let result = engine.sanitize(&input);
    debug!(
        "Sanitized {} bytes into {} bytes (modified: {}).",
        input.len(),
        result.html().len(),
        result.was_modified()
    );

    handle_primary_output(cmd, &input, &result)?;

    if !quiet && !cmd.no_summary {
        summary::print_summary(&mut stderr, &result.counts(), stderr_color).context("Failed to write summary")?;
    }

    info!("Sanitize operation completed.");
    Ok(())
}

fn handle_primary_output(cmd: &SanitizeCommand, input: &str, result: &SanitizationResult) -> Result<()> {
    let stdout = io::stdout();
    let use_color = stdout.is_terminal();
    let mut out = stdout.lock();

    if let Some(path) = &cmd.output {
        fs::write(path, result.html())
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        let mut stderr = io::stderr();
        let stderr_color = stderr.is_terminal();
        output_format::print_info_message(
            &mut stderr,
            &format!("Sanitized content written to {}", path.display()),
            stderr_color,
        )?;
    }

    if cmd.json_stdout {
        serde_json::to_writer_pretty(&mut out, result).context("Failed to serialize result")?;
        writeln!(out)?;
    } else if cmd.diff {
        diff_viewer::print_diff(&mut out, input, result.html(), use_color)?;
    } else if cmd.output.is_none() {
        out.write_all(result.html().as_bytes())?;
    }
    out.flush()?;
    Ok(())
}
