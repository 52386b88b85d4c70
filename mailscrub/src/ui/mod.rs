// mailscrub/src/ui/mod.rs
//! Terminal output helpers: status messages, the sanitization summary and
//! the diff view. Everything writes to a caller-supplied writer and only
//! colours output when told the target is a terminal.

pub mod diff_viewer;
pub mod output_format;
pub mod summary;
