// mailscrub-core/src/engines/streaming_engine.rs
//! A `SanitizationEngine` implementation that rewrites markup as it streams
//! through `lol_html`, without building a DOM.
//!
//! `sanitize_stream` works on any `Read`/`Write` pair and reads the input in
//! fixed-size chunks, so memory use does not grow with the document.
//! License: MIT OR APACHE 2.0

use std::cell::{Cell, RefCell};
use std::io::{ErrorKind, Read, Write};

use lol_html::{element, HtmlRewriter, Settings};
use log::{debug, warn};

use crate::adapters::streaming::{IMAGE_SELECTOR, LINK_SELECTOR};
use crate::config::RuleSet;
use crate::engine::{SanitizationCounts, SanitizationEngine, SanitizationResult, SanitizerCore};
use crate::errors::ScrubError;
use crate::link_cleaner::LinkCleaner;
use crate::options::SanitizerOptions;

pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct StreamingEngine {
    core: SanitizerCore,
}

impl StreamingEngine {
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

    /// Sanitizes markup read from `reader`, writing the result to `writer`.
    ///
    /// Output is flushed to `writer` after every chunk. On error, whatever
    /// was already written stays written.
    pub fn sanitize_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
    ) -> Result<SanitizationCounts, ScrubError> {
        let options = self.core.options();
        let urls_cleaned = Cell::new(0usize);
        let pixels_removed = Cell::new(0usize);
        let pending: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(CHUNK_SIZE));

        let mut handlers = Vec::new();
        if options.clean_urls {
            handlers.push(element!(LINK_SELECTOR, |el| {
                if self.core.rewrite_link(el) {
                    urls_cleaned.set(urls_cleaned.get() + 1);
                }
                Ok(())
            }));
        }
        if options.remove_tracking_pixels {
            handlers.push(element!(IMAGE_SELECTOR, |el| {
                if self.core.drop_pixel(el) {
                    pixels_removed.set(pixels_removed.get() + 1);
                }
                Ok(())
            }));
        }
        if !options.preserve_document_structure {
            handlers.push(element!("head", |el| {
                el.remove();
                Ok(())
            }));
            handlers.push(element!("html, body", |el| {
                el.remove_and_keep_content();
                Ok(())
            }));
        }

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                ..Settings::new()
            },
            |chunk: &[u8]| pending.borrow_mut().extend_from_slice(chunk),
        );

        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            rewriter.write(&buf[..read])?;
            drain(&pending, &mut writer)?;
        }
        rewriter.end()?;
        drain(&pending, &mut writer)?;
        writer.flush()?;

        let counts = SanitizationCounts {
            urls_cleaned: urls_cleaned.get(),
            tracking_pixels_removed: pixels_removed.get(),
        };
        debug!(
            "Streaming pass cleaned {} link(s) and removed {} pixel(s).",
            counts.urls_cleaned, counts.tracking_pixels_removed
        );
        Ok(counts)
    }
}

fn drain<W: Write>(pending: &RefCell<Vec<u8>>, writer: &mut W) -> Result<(), ScrubError> {
    let mut pending = pending.borrow_mut();
    if !pending.is_empty() {
        writer.write_all(&pending)?;
        pending.clear();
    }
    Ok(())
}

impl SanitizationEngine for StreamingEngine {
    fn sanitize(&self, html: &str) -> SanitizationResult {
        if html.trim().is_empty() {
            return SanitizationResult::unmodified(html);
        }

        let mut output = Vec::with_capacity(html.len());
        let counts = match self.sanitize_stream(html.as_bytes(), &mut output) {
            Ok(counts) => counts,
            Err(e) => {
                warn!("Streaming rewrite failed, returning input unchanged: {}", e);
                return SanitizationResult::unmodified(html);
            }
        };

        if !counts.was_modified() && self.core.options().preserve_document_structure {
            return SanitizationResult::unmodified(html);
        }
        match String::from_utf8(output) {
            Ok(html_out) => SanitizationResult::new(html_out, counts),
            Err(e) => {
                warn!("Streaming rewrite produced invalid UTF-8, returning input unchanged: {}", e);
                SanitizationResult::unmodified(html)
            }
        }
    }

    fn options(&self) -> &SanitizerOptions {
        self.core.options()
    }

    fn link_cleaner(&self) -> &LinkCleaner {
        self.core.link_cleaner()
    }
}
