//! # SegDB Core
//!
//! Core engine for SegDB, an embeddable segment store.
//!
//! This crate provides:
//! - [`Predicate`], the filter expression compiler and evaluator
//! - [`IndexManager`], the inverted index over segment attributes
//! - [`SegmentStore`], which owns the segments, keeps the index in sync and
//!   writes mutations through to a storage backend
//!
//! ## Queries
//!
//! - [`SegmentStore::list`] selects segments by exact index match and
//!   paginates the result.
//! - [`SegmentStore::query`] narrows candidates through any index keys in
//!   the supplied attributes, then evaluates each candidate's filter
//!   against the remaining attributes.
//!
//! ```rust
//! use segdb_codec::Value;
//! use segdb_core::{IndexFilter, Segment, SegmentStore};
//!
//! let store = SegmentStore::in_memory();
//! store
//!     .publish(vec![
//!         Segment::new("spring", "country == 'US'").with_index("campaign", 7),
//!         Segment::new("summer", "true").with_index("campaign", 8),
//!     ])
//!     .unwrap();
//!
//! let mut filter = IndexFilter::new();
//! filter.insert("campaign".to_string(), Value::Integer(7));
//! let page = store.list(&filter, 10, 0);
//! assert_eq!(page[0].id, "spring");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod index;
mod predicate;
mod query;
mod segment;
mod stats;
mod store;

pub use config::{StoreConfig, DEFAULT_STORAGE_PATH};
pub use error::{CoreError, CoreResult};
pub use index::{IdList, IndexManager};
pub use predicate::{Attributes, CompileError, Predicate};
pub use query::IndexFilter;
pub use segment::Segment;
pub use stats::{OperationStats, StatsSnapshot, StoreStats};
pub use store::SegmentStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
