// mailscrub-core/src/lib.rs
//! # MailScrub Core Library
//!
//! `mailscrub-core` strips tracking from HTML email. It rewrites every link
//! through a rule-driven URL cleaner (tracking parameters removed, redirect
//! wrappers unwrapped) and removes images that look like open-tracking pixels.
//!
//! The library does no I/O of its own beyond optional rule and option file
//! loaders. Everything else is a pure transformation of the input markup.
//!
//! ## Modules
//!
//! * `config`: Defines `ProviderRule`s and the ordered `RuleSet`, with loading and merging.
//! * `rules`: Compiles a `RuleSet` into regex sets ready for matching.
//! * `diagnostics`: Reports rule patterns that failed to compile.
//! * `link_cleaner`: Cleans a single URL against the compiled rules.
//! * `pixel`: Classifies `<img>` elements as tracking pixels.
//! * `element`: The element and document capabilities the sanitizers work against.
//! * `adapters`: Binds those capabilities to `dom_query` and `lol_html`.
//! * `options`: Defines `SanitizerOptions`, loadable from YAML.
//! * `engine`: Defines the `SanitizationEngine` trait and result types.
//! * `engines`: Contains the buffered and streaming engine implementations.
//! * `headless`: Convenience wrappers for one-shot, non-interactive use.
//! * `errors`: The crate's error type.
//!
//! ## Public API
//!
//! **Rules**
//!
//! * [`RuleSet`]: An ordered collection of `ProviderRule`s. The `globalRules` entry applies to every URL.
//! * [`RuleSet::load_default_rules`]: Loads the bundled provider rules.
//! * [`RuleSet::load_from_file`]: Loads rules from a JSON file.
//! * [`merge_rule_sets`]: Merges user rules over the bundled ones.
//!
//! **Cleaning**
//!
//! * [`LinkCleaner`]: Cleans URLs. Safe to share between threads.
//! * [`TrackerPixelRemover`]: Decides whether an image is a tracking pixel.
//!
//! **Sanitization Engine**
//!
//! * [`SanitizationEngine`]: A trait for pluggable sanitization methods.
//! * [`BufferedEngine`]: Parses the whole document into a DOM.
//! * [`StreamingEngine`]: Rewrites markup as it streams through.
//! * [`headless_sanitize_html`]: A convenience function for a full, one-shot sanitization.
//!
//! ## Usage Example
//!
//! ```rust
//! use mailscrub_core::{headless_sanitize_html, HeadlessEngineType, SanitizerOptions};
//!
//! let html = r#"<a href="https://shop.example/item?id=3&utm_source=newsletter">Item</a>"#;
//! let result = headless_sanitize_html(html, SanitizerOptions::default(), None, HeadlessEngineType::Streaming);
//!
//! assert_eq!(result.urls_cleaned(), 1);
//! assert!(result.html().contains("https://shop.example/item?id=3"));
//! ```
//!
//! ## Error Handling
//!
//! Sanitizing markup never fails: anything that cannot be processed is passed
//! through unchanged. Loaders return `anyhow::Result`, and URL cleaning
//! returns [`ScrubError`].
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod adapters;
pub mod config;
pub mod diagnostics;
pub mod element;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod link_cleaner;
pub mod options;
pub mod pixel;
pub mod rules;

/// Re-exports the rule types and functions for managing provider rules.
pub use config::{merge_rule_sets, ProviderRule, RuleSet, GLOBAL_PROVIDER_KEY, MAX_PATTERN_LENGTH};

/// Re-exports the custom error type for clear error reporting.
pub use errors::ScrubError;

/// Re-exports diagnostics for reporting rule compilation problems.
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, LogSink, NullSink};

pub use element::{DocumentLike, ElementLike};
pub use link_cleaner::{ExceptionPolicy, LinkCleaner, MAX_REDIRECT_DEPTH};
pub use pixel::{PixelVerdict, TrackerPixelRemover, TrackingPixelOptions, TrackingPixelOverrides};
pub use options::SanitizerOptions;

/// Re-exports types related to the core sanitization engine trait.
pub use engine::{SanitizationCounts, SanitizationEngine, SanitizationResult, SanitizerCore};

pub use engines::buffered_engine::BufferedEngine;
pub use engines::streaming_engine::StreamingEngine;

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{build_engine, headless_clean_url, headless_sanitize_html, HeadlessEngineType};

pub use rules::compiler::{compile_rule_set, default_compiled_rules, CompiledProviderRule, CompiledRuleSet};
