//! In-memory storage backend for testing.

use crate::backend::SegmentBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use segdb_codec::{decode_record, encode_record, SegmentRecord};
use std::collections::BTreeMap;

/// An in-memory storage backend.
///
/// Records are kept in their encoded form, so everything that goes through
/// this backend is exercised by the same codec as the directory backend.
/// Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Example
///
/// ```rust
/// use segdb_codec::SegmentRecord;
/// use segdb_storage::{InMemoryBackend, SegmentBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.save(&SegmentRecord::new("a", "true")).unwrap();
/// assert_eq!(backend.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with records.
    ///
    /// Useful for testing reload scenarios.
    ///
    /// # Errors
    ///
    /// Returns an error if any record fails to encode.
    pub fn with_records<I>(records: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = SegmentRecord>,
    {
        let mut backend = Self::new();
        for record in records {
            backend.save(&record)?;
        }
        Ok(backend)
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns the stored IDs in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.records.read().keys().cloned().collect()
    }
}

impl SegmentBackend for InMemoryBackend {
    fn save(&mut self, record: &SegmentRecord) -> StorageResult<()> {
        let bytes = encode_record(record)?;
        self.records.write().insert(record.id.clone(), bytes);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        match self.records.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(StorageError::Missing(id.to_string())),
        }
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.records.write().clear();
        Ok(())
    }

    fn load(&self) -> StorageResult<BTreeMap<String, SegmentRecord>> {
        let records = self.records.read();
        let mut loaded = BTreeMap::new();
        for (id, bytes) in records.iter() {
            loaded.insert(id.clone(), decode_record(bytes)?);
        }
        Ok(loaded)
    }
}
