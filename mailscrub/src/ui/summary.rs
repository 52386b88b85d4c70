// mailscrub/src/ui/summary.rs
//! Renders the per-run sanitization summary.

use mailscrub_core::SanitizationCounts;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes a short human-readable summary of what was removed.
pub fn print_summary<W: Write>(writer: &mut W, counts: &SanitizationCounts, use_color: bool) -> io::Result<()> {
    if !counts.was_modified() {
        let line = "No tracking links or pixels found.";
        return if use_color {
            writeln!(writer, "{}", line.green())
        } else {
            writeln!(writer, "{}", line)
        };
    }

    let header = "Sanitization summary:";
    if use_color {
        writeln!(writer, "{}", header.bold())?;
    } else {
        writeln!(writer, "{}", header)?;
    }
    print_row(writer, "Links cleaned", counts.urls_cleaned, use_color)?;
    print_row(writer, "Tracking pixels removed", counts.tracking_pixels_removed, use_color)
}

fn print_row<W: Write>(writer: &mut W, label: &str, count: usize, use_color: bool) -> io::Result<()> {
    if use_color && count > 0 {
        writeln!(writer, "  {:<24} {}", label, count.yellow())
    } else {
        writeln!(writer, "  {:<24} {}", label, count)
    }
}
