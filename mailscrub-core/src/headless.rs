// mailscrub-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for using the core engines in headless mode (non-UI).
//! Provides one-shot helpers for sanitizing an HTML string or cleaning a
//! single URL with the bundled rules merged with optional user rules.
//!
//! License: MIT OR APACHE 2.0

use log::warn;

use crate::config::{merge_rule_sets, RuleSet};
use crate::engine::{SanitizationEngine, SanitizationResult};
use crate::engines::buffered_engine::BufferedEngine;
use crate::engines::streaming_engine::StreamingEngine;
use crate::errors::ScrubError;
use crate::link_cleaner::LinkCleaner;
use crate::options::SanitizerOptions;

/// Enum to select which sanitization engine to use in headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadlessEngineType {
    #[default]
    Buffered,
    Streaming,
}

/// Builds an engine of the requested type behind the `SanitizationEngine` trait.
pub fn build_engine(
    options: SanitizerOptions,
    user_rules: Option<RuleSet>,
    engine_type: HeadlessEngineType,
) -> Box<dyn SanitizationEngine> {
    let links = link_cleaner_for(user_rules);
    match engine_type {
        HeadlessEngineType::Buffered => Box::new(BufferedEngine::from_parts(links, options)),
        HeadlessEngineType::Streaming => Box::new(StreamingEngine::from_parts(links, options)),
    }
}

/// Fully sanitizes an HTML string with the bundled rules, merged with
/// `user_rules` when given. This is the primary entry point for
/// non-interactive use.
pub fn headless_sanitize_html(
    html: &str,
    options: SanitizerOptions,
    user_rules: Option<RuleSet>,
    engine_type: HeadlessEngineType,
) -> SanitizationResult {
    build_engine(options, user_rules, engine_type).sanitize(html)
}

/// Cleans one URL with the bundled rules, merged with `user_rules` when given.
pub fn headless_clean_url(url: &str, user_rules: Option<RuleSet>) -> Result<String, ScrubError> {
    link_cleaner_for(user_rules).clean(url)
}

fn link_cleaner_for(user_rules: Option<RuleSet>) -> LinkCleaner {
    match user_rules {
        None => LinkCleaner::with_default_rules(),
        Some(user) => match RuleSet::load_default_rules() {
            Ok(defaults) => LinkCleaner::new(&merge_rule_sets(defaults, Some(user))),
            Err(e) => {
                warn!("Bundled rules unavailable, using user rules only: {:#}", e);
                LinkCleaner::new(&user)
            }
        },
    }
}
