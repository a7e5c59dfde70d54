//! Test fixtures for Strata development.
//!
//! Deterministic payload generators so tests and benchmarks build the
//! same byte sequences on every run, a comparison counter for checking
//! how often container lookups call their equality predicate, and a
//! one-line logging hook.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{payload, payloads, CountingEquals};

use strata_core::logging::{self, LogConfig};

/// Install the tagged log formatter for a test binary.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init_logging() {
    let _ = logging::init(&LogConfig::default());
}
