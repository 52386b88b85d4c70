// mailscrub-core/src/engines/buffered_engine.rs
//! A `SanitizationEngine` implementation that parses the whole document into
//! a DOM before cleaning links and removing tracking pixels.
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::adapters::buffered::BufferedDocument;
use crate::config::RuleSet;
use crate::element::DocumentLike;
use crate::engine::{SanitizationCounts, SanitizationEngine, SanitizationResult, SanitizerCore};
use crate::link_cleaner::LinkCleaner;
use crate::options::SanitizerOptions;

#[derive(Debug, Clone)]
pub struct BufferedEngine {
    core: SanitizerCore,
}

impl BufferedEngine {
    pub fn new(rule_set: &RuleSet, options: SanitizerOptions) -> Self {
        Self::from_parts(LinkCleaner::new(rule_set), options)
    }

    /// Builds an engine over the bundled provider rules.
    pub fn with_default_rules(options: SanitizerOptions) -> Self {
        Self::from_parts(LinkCleaner::with_default_rules(), options)
    }

    pub fn from_parts(links: LinkCleaner, options: SanitizerOptions) -> Self {
        Self { core: SanitizerCore::new(links, options) }
    }
}

impl SanitizationEngine for BufferedEngine {
    fn sanitize(&self, html: &str) -> SanitizationResult {
        if html.trim().is_empty() {
            return SanitizationResult::unmodified(html);
        }

        let options = self.core.options();
        let doc = BufferedDocument::parse(html);
        let mut counts = SanitizationCounts::default();

        if options.clean_urls {
            for mut link in doc.link_elements() {
                if self.core.rewrite_link(&mut link) {
                    counts.urls_cleaned += 1;
                }
            }
        }
        if options.remove_tracking_pixels {
            counts.tracking_pixels_removed = self.core.pixel_remover().clean(&doc);
        }

        debug!(
            "Buffered pass cleaned {} link(s) and removed {} pixel(s).",
            counts.urls_cleaned, counts.tracking_pixels_removed
        );

        if !counts.was_modified() && options.preserve_document_structure {
            return SanitizationResult::unmodified(html);
        }
        SanitizationResult::new(doc.to_html(options.preserve_document_structure), counts)
    }

    fn options(&self) -> &SanitizerOptions {
        self.core.options()
    }

    fn link_cleaner(&self) -> &LinkCleaner {
        self.core.link_cleaner()
    }
}
