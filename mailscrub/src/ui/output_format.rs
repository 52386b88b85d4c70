// mailscrub/src/ui/output_format.rs
//! Prefixed status messages for stderr.

use owo_colors::OwoColorize;
use std::io::{self, Write};

pub fn print_info_message<W: Write>(writer: &mut W, message: &str, use_color: bool) -> io::Result<()> {
    if use_color {
        writeln!(writer, "{} {}", "info:".cyan().bold(), message)
    } else {
        writeln!(writer, "info: {}", message)
    }
}

pub fn print_warn_message<W: Write>(writer: &mut W, message: &str, use_color: bool) -> io::Result<()> {
    if use_color {
        writeln!(writer, "{} {}", "warning:".yellow().bold(), message)
    } else {
        writeln!(writer, "warning: {}", message)
    }
}

pub fn print_error_message<W: Write>(writer: &mut W, message: &str, use_color: bool) -> io::Result<()> {
    if use_color {
        writeln!(writer, "{} {}", "error:".red().bold(), message)
    } else {
        writeln!(writer, "error: {}", message)
    }
}
