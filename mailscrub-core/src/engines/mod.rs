// mailscrub-core/src/engines/mod.rs
//! Sanitization engine implementations.
//!
//! Each engine lives in its own file and implements the `SanitizationEngine`
//! trait on top of a shared `SanitizerCore`:
//!
//! * `buffered_engine` parses the whole document into a DOM first.
//! * `streaming_engine` rewrites elements as the markup flows through, and can
//!   work directly on `Read`/`Write` pairs.
//!
//! License: MIT OR APACHE 2.0

pub mod buffered_engine;
pub mod streaming_engine;
