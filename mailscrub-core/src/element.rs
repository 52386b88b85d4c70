//! Element and document capabilities consumed by the sanitizers.
//!
//! The engine never talks to an HTML library directly. Anything that can
//! read and write attributes and detach itself can be classified and
//! rewritten, which lets the buffered and streaming adapters share all of the
//! matching logic.

/// The attribute-level capabilities the sanitizers need from an element.
pub trait ElementLike {
    fn get_attribute(&self, name: &str) -> Option<String>;

    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    fn set_attribute(&mut self, name: &str, value: &str);

    fn remove_attribute(&mut self, name: &str);

    /// Detaches the element (and its content) from its parent.
    fn remove(&mut self);
}

/// A document that can enumerate its candidate elements.
pub trait DocumentLike {
    type Element<'a>: ElementLike
    where
        Self: 'a;

    /// Every image-like element in the document.
    fn image_elements(&self) -> Vec<Self::Element<'_>>;

    /// Every anchor element that carries an `href`.
    fn link_elements(&self) -> Vec<Self::Element<'_>>;
}
