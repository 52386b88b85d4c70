//! Rule compilation for the URL sanitizer.
//!
//! This module turns the declarative `RuleSet` from `config` into the
//! pre-compiled form consumed by `link_cleaner`. It works closely with
//! `diagnostics`, which receives every pattern that had to be dropped.

pub mod compiler;
