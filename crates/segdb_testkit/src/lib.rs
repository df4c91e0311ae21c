//! # SegDB Testkit
//!
//! Test utilities for SegDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A fault-injecting storage backend
//! - Concurrent stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use segdb_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.add(sample_segment(0)).unwrap();
//!     assert_eq!(store.len(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fault::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
