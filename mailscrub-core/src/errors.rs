//! errors.rs - Custom error types for the mailscrub-core library.
//!
//! Only failures that a caller can act on are represented here. Problems that
//! the engine recovers from on its own (a bad pattern in a rule set, a
//! redirection value that is not a URL) are reported through the
//! `diagnostics` module or the `log` facade instead.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `mailscrub-core` library.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScrubError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to parse rule set: {0}")]
    RuleSetParse(String),

    #[error("HTML rewriting failed: {0}")]
    Rewriting(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}

impl From<lol_html::errors::RewritingError> for ScrubError {
    fn from(e: lol_html::errors::RewritingError) -> Self {
        ScrubError::Rewriting(e.to_string())
    }
}

impl From<serde_json::Error> for ScrubError {
    fn from(e: serde_json::Error) -> Self {
        ScrubError::RuleSetParse(e.to_string())
    }
}
