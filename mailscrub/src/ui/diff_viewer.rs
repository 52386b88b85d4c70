// mailscrub/src/ui/diff_viewer.rs
//! Unified-diff view of a sanitization run.
//!
//! Highlights exactly what was removed (red) and what was added (green).

use diffy::{create_patch, Line as DiffLine};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes a line-based diff between `original` and `sanitized`.
pub fn print_diff<W: Write>(writer: &mut W, original: &str, sanitized: &str, use_color: bool) -> io::Result<()> {
    let patch = create_patch(original, sanitized);
    let header = "--- Diff Analysis ---";
    if use_color {
        writeln!(writer, "{}", header.yellow().bold())?;
    } else {
        writeln!(writer, "{}", header)?;
    }

    let mut changed = false;
    for hunk in patch.hunks() {
        for line_change in hunk.lines() {
            match line_change {
                DiffLine::Delete(s) => {
                    changed = true;
                    let s = s.trim_end_matches('\n');
                    if use_color {
                        writeln!(writer, "{}", format!("- {}", s).red())?;
                    } else {
                        writeln!(writer, "- {}", s)?;
                    }
                }
                DiffLine::Insert(s) => {
                    changed = true;
                    let s = s.trim_end_matches('\n');
                    if use_color {
                        writeln!(writer, "{}", format!("+ {}", s).green())?;
                    } else {
                        writeln!(writer, "+ {}", s)?;
                    }
                }
                DiffLine::Context(s) => writeln!(writer, "  {}", s.trim_end_matches('\n'))?,
            }
        }
    }

    if !changed {
        writeln!(writer, "No changes detected.")?;
    }
    Ok(())
}
