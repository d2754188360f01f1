//! # RELIDB Testkit
//!
//! Test utilities for RELIDB.
//!
//! This crate provides:
//! - Sample entity types with hand-written schema registrations
//! - Seeded in-memory backends for common scenarios
//! - A tracing initializer for debugging test runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relidb_testkit::fixtures::{seeded_track_backend, Track};
//!
//! #[test]
//! fn finds_tracks() {
//!     let backend = seeded_track_backend();
//!     // ... query operations
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;

use tracing_subscriber::EnvFilter;

/// Initializes tracing for a test run.
///
/// Respects `RUST_LOG`; defaults to `warn` so drop-flush warnings are
/// visible. Safe to call from several tests - only the first call
/// installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
