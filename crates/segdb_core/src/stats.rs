//! Store statistics.
//!
//! Operation counters are atomic and can be read while operations are in
//! progress. [`StoreStats`] combines a counter snapshot with the current
//! size of the segment map and the index.
//!
//! ```
//! use segdb_core::{Segment, SegmentStore};
//!
//! let store = SegmentStore::in_memory();
//! store.add(Segment::new("seg1", "level >= 1").with_index("idx1", 1)).unwrap();
//!
//! let stats = store.stats();
//! assert_eq!(stats.segments, 1);
//! assert_eq!(stats.index_entries, 1);
//! assert_eq!(stats.ops.writes, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters.
#[derive(Debug, Default)]
pub struct OperationStats {
    /// Get/GetAll calls.
    reads: AtomicU64,
    /// Successful adds.
    writes: AtomicU64,
    /// Successful deletes.
    deletes: AtomicU64,
    /// Successful publishes.
    publishes: AtomicU64,
    /// Successful loads.
    loads: AtomicU64,
    /// List and Query calls.
    queries: AtomicU64,
    /// Queries that evaluated every segment.
    scans: AtomicU64,
    /// Queries narrowed through the index.
    index_lookups: AtomicU64,
    /// Failed operations.
    errors: AtomicU64,
}

impl OperationStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_publish(&self) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Get/GetAll calls.
    pub reads: u64,
    /// Successful adds.
    pub writes: u64,
    /// Successful deletes.
    pub deletes: u64,
    /// Successful publishes.
    pub publishes: u64,
    /// Successful loads.
    pub loads: u64,
    /// List and Query calls.
    pub queries: u64,
    /// Queries that evaluated every segment.
    ///
    /// High scan counts may indicate that callers are not passing index keys.
    pub scans: u64,
    /// Queries narrowed through the index.
    pub index_lookups: u64,
    /// Failed operations.
    pub errors: u64,
}

/// Size of the store plus its operation counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Live segments.
    pub segments: usize,
    /// Distinct index attribute names.
    pub index_attributes: usize,
    /// Distinct (attribute, value) buckets.
    pub index_buckets: usize,
    /// Segment IDs across all buckets.
    pub index_entries: usize,
    /// Estimated heap usage of the index, in bytes.
    pub index_footprint: usize,
    /// Operation counters.
    pub ops: StatsSnapshot,
}
