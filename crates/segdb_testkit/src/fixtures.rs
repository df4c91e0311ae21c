//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and common
//! test scenarios.

use segdb_core::{Segment, SegmentStore, StoreConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: SegmentStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: SegmentStore::in_memory(),
            temp_dir: None,
        }
    }

    /// Creates a new directory-backed test store.
    pub fn dir() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SegmentStore::open(Self::config_for(temp_dir.path()))
            .expect("Failed to open directory store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the segment directory if directory-backed, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("segments"))
    }

    /// Drops the store and opens a fresh one over the same directory.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn reopen(self) -> Self {
        let temp_dir = self.temp_dir.expect("Only directory stores can be reopened");
        drop(self.store);
        let store = SegmentStore::open(Self::config_for(temp_dir.path()))
            .expect("Failed to reopen directory store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    fn config_for(root: &Path) -> StoreConfig {
        StoreConfig::new().storage_path(root.join("segments"))
    }
}

impl std::ops::Deref for TestStore {
    type Target = SegmentStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&SegmentStore) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary directory-backed store.
pub fn with_dir_store<F, R>(f: F) -> R
where
    F: FnOnce(&SegmentStore, &Path) -> R,
{
    let test_store = TestStore::dir();
    let path = test_store.path().expect("Directory store should have a path");
    f(&test_store.store, &path)
}

/// The `i`-th sample segment.
///
/// Every sample uses the filter `level >= 1 && uvs in [1,2,3]`, indexes
/// `idx1` by `i % 3` and `idx2` by a string.
pub fn sample_segment(i: usize) -> Segment {
    Segment::new(format!("seg{i}"), "level >= 1 && uvs in [1,2,3]")
        .with_data(format!("payload {i}"))
        .with_index("idx1", i64::try_from(i % 3).unwrap_or_default())
        .with_index("idx2", format!("idx2_{i}"))
}

/// Creates an in-memory store holding `count` sample segments.
pub fn populated_store(count: usize) -> TestStore {
    let test_store = TestStore::memory();
    for i in 0..count {
        test_store
            .store
            .add(sample_segment(i))
            .expect("Failed to add sample segment");
    }
    test_store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_has_no_path() {
        let store = TestStore::memory();
        assert!(store.path().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn dir_store_survives_reopen() {
        let store = TestStore::dir();
        store.add(sample_segment(1)).unwrap();
        assert!(store.path().unwrap().join("seg1.seg").exists());

        let store = store.reopen();
        assert_eq!(*store.get("seg1").unwrap(), sample_segment(1));
    }

    #[test]
    fn populated_store_counts() {
        let store = populated_store(7);
        assert_eq!(store.len(), 7);
        store.verify().unwrap();
    }

    #[test]
    fn with_dir_store_passes_path() {
        with_dir_store(|store, path| {
            store.add(sample_segment(0)).unwrap();
            assert!(path.join("seg0.seg").exists());
        });
    }
}
