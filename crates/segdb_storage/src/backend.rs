//! Storage backend trait definition.

use crate::error::StorageResult;
use segdb_codec::SegmentRecord;
use std::collections::BTreeMap;

/// A durable home for segment records.
///
/// # Invariants
///
/// - `save` overwrites any record previously saved under the same ID
/// - `load` returns exactly the records saved and not since deleted or cleared
/// - `clear` removes every record; clearing an empty backend succeeds
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::DirBackend`] - For persistent storage
pub trait SegmentBackend: Send + Sync {
    /// Persists one record, replacing any previous record with the same ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    fn save(&mut self, record: &SegmentRecord) -> StorageResult<()>;

    /// Removes the record with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Missing`] if no such record exists, or
    /// an I/O error if removal fails.
    fn delete(&mut self, id: &str) -> StorageResult<()>;

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be removed.
    fn clear(&mut self) -> StorageResult<()>;

    /// Reads every stored record, keyed by ID.
    ///
    /// The map is ordered by ID so callers can rebuild derived state in a
    /// deterministic order.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be read or decoded.
    fn load(&self) -> StorageResult<BTreeMap<String, SegmentRecord>>;
}

impl<B: SegmentBackend + ?Sized> SegmentBackend for Box<B> {
    fn save(&mut self, record: &SegmentRecord) -> StorageResult<()> {
        (**self).save(record)
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        (**self).delete(id)
    }

    fn clear(&mut self) -> StorageResult<()> {
        (**self).clear()
    }

    fn load(&self) -> StorageResult<BTreeMap<String, SegmentRecord>> {
        (**self).load()
    }
}
