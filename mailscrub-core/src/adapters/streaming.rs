//! Streaming adapter over `lol_html`.
//!
//! Elements are rewritten as they pass through the rewriter, so the document
//! is never held in memory as a tree. The `ElementLike` impl below is the only
//! bridge between the rewriter and the sanitizer logic.
//!
//! `lol_html` exposes attribute values as raw source text, so character
//! references (the full HTML5 named table as well as numeric ones) are
//! decoded on read and `&` is escaped again on write. The sanitizers
//! therefore see the same values as with the buffered adapter.

use html_escape::decode_html_entities;
use lol_html::html_content::Element;
use log::warn;

use crate::element::ElementLike;

/// CSS selector for anchors handed to the link cleaner.
pub const LINK_SELECTOR: &str = "a[href]";
/// CSS selector for images handed to the pixel evaluator.
pub const IMAGE_SELECTOR: &str = "img";

impl ElementLike for Element<'_, '_> {
    fn get_attribute(&self, name: &str) -> Option<String> {
        Element::get_attribute(self, name).map(|raw| decode_html_entities(&raw).into_owned())
    }

    fn has_attribute(&self, name: &str) -> bool {
        Element::has_attribute(self, name)
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        if let Err(e) = Element::set_attribute(self, name, &value.replace('&', "&amp;")) {
            warn!("Could not set attribute '{}' on <{}>: {}", name, self.tag_name(), e);
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        Element::remove_attribute(self, name);
    }

    fn remove(&mut self) {
        Element::remove(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lol_html::{element, rewrite_str, RewriteStrSettings};

    #[test]
    fn character_references_are_decoded() {
        let output = rewrite_str(
            r#"<img src="https://a.com/p?x=1&amp;y=&#38;&#x26;&amp;n=&nbsp;&copy;&unknown;">"#,
            RewriteStrSettings {
                element_content_handlers: vec![element!(IMAGE_SELECTOR, |el| {
                    let src = ElementLike::get_attribute(el, "src").unwrap_or_default();
                    assert_eq!(src, "https://a.com/p?x=1&y=&&&n=\u{a0}\u{a9}&unknown;");
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )
        .unwrap();
        assert!(output.contains("&amp;y="));
    }

    #[test]
    fn escaped_ampersands_survive_a_rewrite() {
        let output = rewrite_str(
            r#"<a href="https://a.com/?x=1&amp;y=2">a</a>"#,
            RewriteStrSettings {
                element_content_handlers: vec![element!(LINK_SELECTOR, |el| {
                    let href = ElementLike::get_attribute(el, "href").unwrap_or_default();
                    assert_eq!(href, "https://a.com/?x=1&y=2");
                    ElementLike::set_attribute(el, "href", &href.replace("x=1&", ""));
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )
        .unwrap();

        assert_eq!(output, r#"<a href="https://a.com/?y=2">a</a>"#);
    }

    #[test]
    fn rewriter_elements_implement_the_capability() {
        let output = rewrite_str(
            r#"<a href="https://a.com/?x=1" rel="r">a</a><img src="p.gif">"#,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!(LINK_SELECTOR, |el| {
                        assert!(ElementLike::has_attribute(el, "rel"));
                        ElementLike::set_attribute(el, "href", "https://a.com/");
                        ElementLike::remove_attribute(el, "rel");
                        Ok(())
                    }),
                    element!(IMAGE_SELECTOR, |el| {
                        assert_eq!(ElementLike::get_attribute(el, "src").as_deref(), Some("p.gif"));
                        ElementLike::remove(el);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        )
        .unwrap();

        assert_eq!(output, r#"<a href="https://a.com/">a</a>"#);
    }
}
