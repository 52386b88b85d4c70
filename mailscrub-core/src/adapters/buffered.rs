//! Whole-document adapter over `dom_query`.
//!
//! The full HTML is parsed into a DOM, anchors and images are visited through
//! the `ElementLike` capability, and the mutated tree is serialized back.

use dom_query::{Document, Selection};

use crate::element::{DocumentLike, ElementLike};

/// A single DOM element, seen through the sanitizer's element capability.
pub struct BufferedElement<'a> {
    sel: Selection<'a>,
}

impl<'a> BufferedElement<'a> {
    pub fn new(sel: Selection<'a>) -> Self {
        Self { sel }
    }
}

impl ElementLike for BufferedElement<'_> {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.sel.attr(name).map(|s| s.to_string())
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.sel.has_attr(name)
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.sel.set_attr(name, value);
    }

    fn remove_attribute(&mut self, name: &str) {
        self.sel.remove_attr(name);
    }

    fn remove(&mut self) {
        self.sel.remove();
    }
}

/// A parsed HTML document.
pub struct BufferedDocument {
    doc: Document,
    is_full_document: bool,
}

impl BufferedDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Document::from(html),
            is_full_document: looks_like_full_document(html),
        }
    }

    /// Serializes the document.
    ///
    /// With `preserve_structure`, a full document keeps its `<html>`/`<head>`
    /// wrapper; fragments are always emitted as fragments. Otherwise only the
    /// body's inner HTML is returned.
    pub fn to_html(&self, preserve_structure: bool) -> String {
        if preserve_structure && self.is_full_document {
            self.doc.html().to_string()
        } else {
            self.doc.select("body").inner_html().to_string()
        }
    }

    fn elements(&self, selector: &str) -> Vec<BufferedElement<'_>> {
        self.doc
            .select(selector)
            .nodes()
            .iter()
            .map(|node| BufferedElement::new(Selection::from(*node)))
            .collect()
    }
}

impl DocumentLike for BufferedDocument {
    type Element<'a> = BufferedElement<'a>;

    fn image_elements(&self) -> Vec<BufferedElement<'_>> {
        self.elements("img")
    }

    fn link_elements(&self) -> Vec<BufferedElement<'_>> {
        self.elements("a[href]")
    }
}

/// True when the markup carries any document-level markup of its own: a
/// doctype, or an `<html>`, `<head>` or `<body>` tag anywhere in the input.
/// Such input is serialized whole so nothing in the head is lost.
pub fn looks_like_full_document(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    lower.contains("<!doctype") || ["<html", "<head", "<body"].iter().any(|tag| opens_tag(&lower, tag))
}

/// `<head` must not match `<header`.
fn opens_tag(lower: &str, tag: &str) -> bool {
    lower.match_indices(tag).any(|(at, _)| {
        matches!(
            lower.as_bytes().get(at + tag.len()),
            None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
        )
    })
}
