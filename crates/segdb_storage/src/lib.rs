//! # SegDB Storage
//!
//! Storage backend trait and implementations for SegDB.
//!
//! Backends are the durable side of the segment store. They know how to
//! save, delete, clear and load whole segment records, and nothing about
//! indexes, predicates or queries.
//!
//! ## Design Principles
//!
//! - One record per segment, keyed by segment ID
//! - Records are stored in the versioned CBOR envelope from `segdb_codec`
//! - Must be `Send + Sync` so the store can be shared across threads
//! - The store serializes all mutating calls; backends need no ordering of their own
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`DirBackend`] - One file per segment under a directory
//!
//! ## Example
//!
//! ```rust
//! use segdb_codec::SegmentRecord;
//! use segdb_storage::{InMemoryBackend, SegmentBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.save(&SegmentRecord::new("seg1", "level >= 1")).unwrap();
//! let loaded = backend.load().unwrap();
//! assert!(loaded.contains_key("seg1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod dir;
mod error;
mod memory;

pub use backend::SegmentBackend;
pub use dir::DirBackend;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
