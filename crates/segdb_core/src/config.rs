//! Store configuration.

use std::path::PathBuf;

/// Default directory for [`crate::SegmentStore::open`].
pub const DEFAULT_STORAGE_PATH: &str = "var/lib/segdb";

/// Configuration for opening a segment store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one file per segment.
    pub storage_path: PathBuf,

    /// Whether to load persisted segments when the store is opened.
    pub load_on_open: bool,

    /// Whether to create the storage directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Candidate count above which a query without index keys logs a
    /// warning (0 = never).
    pub scan_warning_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            load_on_open: true,
            create_if_missing: true,
            scan_warning_threshold: 1000,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage directory.
    #[must_use]
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Sets whether to load persisted segments on open.
    #[must_use]
    pub const fn load_on_open(mut self, value: bool) -> Self {
        self.load_on_open = value;
        self
    }

    /// Sets whether to create the storage directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the full-scan warning threshold.
    #[must_use]
    pub const fn scan_warning_threshold(mut self, count: usize) -> Self {
        self.scan_warning_threshold = count;
        self
    }
}
