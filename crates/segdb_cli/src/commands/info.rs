//! Info command implementation.

use crate::output::{print_report, OutputFormat};
use segdb_core::{SegmentStore, StatsSnapshot};
use serde::Serialize;

/// Store statistics report.
#[derive(Debug, Serialize)]
pub struct InfoReport {
    /// Storage directory.
    pub path: String,
    /// Live segments.
    pub segments: usize,
    /// Distinct index attribute names.
    pub index_attributes: usize,
    /// Distinct (attribute, value) buckets.
    pub index_buckets: usize,
    /// Segment IDs across all buckets.
    pub index_entries: usize,
    /// Estimated index heap usage in bytes.
    pub index_footprint: usize,
    /// Operation counters for this process.
    pub operations: Operations,
}

/// Operation counters.
#[derive(Debug, Serialize)]
pub struct Operations {
    /// Get/GetAll calls.
    pub reads: u64,
    /// Adds.
    pub writes: u64,
    /// Deletes.
    pub deletes: u64,
    /// Publishes.
    pub publishes: u64,
    /// Loads.
    pub loads: u64,
    /// List and query calls.
    pub queries: u64,
    /// Full scans.
    pub scans: u64,
    /// Index lookups.
    pub index_lookups: u64,
    /// Failed operations.
    pub errors: u64,
}

impl From<StatsSnapshot> for Operations {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            reads: s.reads,
            writes: s.writes,
            deletes: s.deletes,
            publishes: s.publishes,
            loads: s.loads,
            queries: s.queries,
            scans: s.scans,
            index_lookups: s.index_lookups,
            errors: s.errors,
        }
    }
}

impl InfoReport {
    /// Collects statistics from an open store.
    pub fn collect(store: &SegmentStore) -> Self {
        let stats = store.stats();
        Self {
            path: store.config().storage_path.display().to_string(),
            segments: stats.segments,
            index_attributes: stats.index_attributes,
            index_buckets: stats.index_buckets,
            index_entries: stats.index_entries,
            index_footprint: stats.index_footprint,
            operations: stats.ops.into(),
        }
    }

    fn text(&self) -> String {
        format!(
            "SegDB Store\n===========\n\
             Path:             {}\n\
             Segments:         {}\n\
             Index attributes: {}\n\
             Index buckets:    {}\n\
             Index entries:    {}\n\
             Index footprint:  {} bytes\n",
            self.path,
            self.segments,
            self.index_attributes,
            self.index_buckets,
            self.index_entries,
            self.index_footprint
        )
    }
}

/// Runs the info command.
pub fn run(store: &SegmentStore, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    print_report(&InfoReport::collect(store), InfoReport::text, format)
}
