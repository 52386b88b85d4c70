//! Delivery adapters that expose concrete HTML libraries through the
//! `element` capability traits.
//!
//! * `buffered`: parses a whole document with `dom_query`.
//! * `streaming`: rewrites elements on the fly with `lol_html`.
//!
//! Neither adapter contains matching logic of its own.

pub mod buffered;
pub mod streaming;
