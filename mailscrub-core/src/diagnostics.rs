//! Structured, injectable diagnostics for non-fatal problems.
//!
//! Rule compilation never aborts on a bad pattern. Instead each failure is
//! turned into a [`Diagnostic`] and handed to a [`DiagnosticSink`], so an
//! embedding host can log, collect, or silence them.
//!
//! License: MIT OR APACHE 2.0

use log::warn;
use std::fmt;
use std::sync::Mutex;

/// Which pattern list of a provider a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleField {
    UrlPattern,
    Rules,
    Exceptions,
    Redirections,
    Referral,
    RawRules,
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleField::UrlPattern => "urlPattern",
            RuleField::Rules => "rules",
            RuleField::Exceptions => "exceptions",
            RuleField::Redirections => "redirections",
            RuleField::Referral => "referral",
            RuleField::RawRules => "rawRules",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem found while preparing a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// A pattern failed to compile and was dropped (or, for `urlPattern`,
    /// left the provider unselectable).
    RuleCompilationWarning {
        provider: String,
        field: RuleField,
        pattern: String,
        message: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RuleCompilationWarning { provider, field, pattern, message } => write!(
                f,
                "Provider '{}': {} pattern '{}' failed to compile: {}",
                provider, field, pattern, message
            ),
        }
    }
}

/// Receives diagnostics emitted during rule compilation.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Routes diagnostics to the `log` facade at `warn` level. This is the default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!(target: "mailscrub_core::diagnostics", "{}", diagnostic);
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Keeps diagnostics in memory for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.diagnostics().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
