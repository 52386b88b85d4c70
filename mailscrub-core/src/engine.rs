// mailscrub-core/src/engine.rs
//! Defines the core SanitizationEngine trait and related data structures.
//!
//! The `SanitizationEngine` trait is the pluggable interface over the two
//! delivery modes (whole-document and streaming). Both engines share a
//! `SanitizerCore`, which owns the link cleaner and pixel evaluator and holds
//! the per-element decisions, so no matching logic lives in an adapter.
//!
//! License: MIT OR APACHE 2.0

use serde::Serialize;

use crate::element::ElementLike;
use crate::link_cleaner::LinkCleaner;
use crate::options::SanitizerOptions;
use crate::pixel::TrackerPixelRemover;

/// Exact per-document counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationCounts {
    pub urls_cleaned: usize,
    pub tracking_pixels_removed: usize,
}

impl SanitizationCounts {
    pub fn was_modified(&self) -> bool {
        self.urls_cleaned > 0 || self.tracking_pixels_removed > 0
    }
}

/// The sanitized HTML together with what was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationResult {
    html: String,
    #[serde(flatten)]
    counts: SanitizationCounts,
    was_modified: bool,
}

impl SanitizationResult {
    pub fn new(html: String, counts: SanitizationCounts) -> Self {
        Self { html, counts, was_modified: counts.was_modified() }
    }

    /// The input passed through untouched, with zero counters.
    pub fn unmodified(html: &str) -> Self {
        Self::new(html.to_string(), SanitizationCounts::default())
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    pub fn counts(&self) -> SanitizationCounts {
        self.counts
    }

    pub fn urls_cleaned(&self) -> usize {
        self.counts.urls_cleaned
    }

    pub fn tracking_pixels_removed(&self) -> usize {
        self.counts.tracking_pixels_removed
    }

    pub fn was_modified(&self) -> bool {
        self.was_modified
    }
}

/// A trait that defines the core functionality of a sanitization engine.
///
/// Sanitization never fails: markup that cannot be processed comes back
/// unchanged with zero counters.
pub trait SanitizationEngine: Send + Sync {
    /// Sanitizes a complete HTML document or fragment.
    fn sanitize(&self, html: &str) -> SanitizationResult;

    /// Returns a reference to the engine's options.
    fn options(&self) -> &SanitizerOptions;

    /// Returns the link cleaner, for callers that also clean bare URLs.
    fn link_cleaner(&self) -> &LinkCleaner;
}

/// Per-element decisions shared by every engine.
#[derive(Debug, Clone)]
pub struct SanitizerCore {
    links: LinkCleaner,
    pixels: TrackerPixelRemover,
    options: SanitizerOptions,
}

impl SanitizerCore {
    pub fn new(links: LinkCleaner, options: SanitizerOptions) -> Self {
        let links = links.with_exception_policy(options.exception_policy);
        let pixels = TrackerPixelRemover::new(options.tracking_pixels.clone());
        Self { links, pixels, options }
    }

    pub fn options(&self) -> &SanitizerOptions {
        &self.options
    }

    pub fn link_cleaner(&self) -> &LinkCleaner {
        &self.links
    }

    pub fn pixel_remover(&self) -> &TrackerPixelRemover {
        &self.pixels
    }

    /// Cleans an anchor's `href` in place. Returns true if it was rewritten.
    pub fn rewrite_link<E: ElementLike + ?Sized>(&self, element: &mut E) -> bool {
        if !self.options.clean_urls {
            return false;
        }
        let Some(href) = element.get_attribute("href") else {
            return false;
        };
        match self.links.clean_href(&href) {
            Some(cleaned) => {
                element.set_attribute("href", &cleaned);
                true
            }
            None => false,
        }
    }

    /// Removes an image if it is a tracking pixel. Returns true if removed.
    pub fn drop_pixel<E: ElementLike + ?Sized>(&self, element: &mut E) -> bool {
        if !self.options.remove_tracking_pixels || !self.pixels.is_tracking_pixel(element) {
            return false;
        }
        element.remove();
        true
    }
}
