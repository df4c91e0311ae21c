//! The segment store.

use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexManager;
use crate::query::{IndexFilter, QueryEngine, QueryPlan, SegmentMap};
use crate::segment::{CompiledSegment, Segment};
use crate::stats::{OperationStats, StoreStats};
use parking_lot::RwLock;
use segdb_codec::Value;
use segdb_storage::{DirBackend, InMemoryBackend, SegmentBackend, StorageError};
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything guarded by the store lock.
struct StoreState {
    segments: SegmentMap,
    index: IndexManager,
    backend: Box<dyn SegmentBackend>,
}

impl StoreState {
    fn replace(&mut self, compiled: Vec<CompiledSegment>) {
        let mut index = IndexManager::new();
        index.rebuild(compiled.iter().map(|c| (&c.id, &c.segment.indexes)));
        self.index = index;
        self.segments = compiled
            .into_iter()
            .map(|c| (Arc::clone(&c.id), c))
            .collect();
    }
}

/// An embeddable segment store.
///
/// The store owns the segment map, keeps the secondary index in sync with
/// it and writes every mutation through to a [`SegmentBackend`].
///
/// One reader/writer lock guards the segment map, the index and the backend
/// together. Reads (`get`, `list`, `query`, `stats`) share it; mutations
/// (`add`, `delete`, `publish`, `load`) hold it exclusively for the whole
/// operation, backend I/O included, so readers never see the index and the
/// backend disagree.
///
/// # Example
///
/// ```rust
/// use segdb_codec::Value;
/// use segdb_core::{Segment, SegmentStore};
/// use std::collections::HashMap;
///
/// let store = SegmentStore::in_memory();
/// store.add(Segment::new("a", "level >= 1").with_index("idx1", 1)).unwrap();
/// store.add(Segment::new("b", "level >= 1").with_index("idx1", 2)).unwrap();
///
/// let mut attrs = HashMap::new();
/// attrs.insert("idx1".to_string(), Value::Integer(1));
/// attrs.insert("level".to_string(), Value::Integer(1));
///
/// let found = store.query(&attrs, 0);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].id, "a");
/// ```
pub struct SegmentStore {
    config: StoreConfig,
    state: RwLock<StoreState>,
    stats: OperationStats,
}

impl SegmentStore {
    /// Opens a directory-backed store at `config.storage_path`.
    ///
    /// Persisted segments are loaded when `config.load_on_open` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing and
    /// `create_if_missing` is false, if it cannot be created, or if loading
    /// fails.
    pub fn open(config: StoreConfig) -> CoreResult<Self> {
        let path = config.storage_path.clone();
        let backend = if config.create_if_missing {
            DirBackend::open_with_create_dirs(&path)?
        } else if path.is_dir() {
            DirBackend::new(&path)
        } else {
            return Err(StorageError::Unavailable(format!(
                "storage directory {} does not exist and create_if_missing is false",
                path.display()
            ))
            .into());
        };

        let load = config.load_on_open;
        let store = Self::with_backend(config, Box::new(backend));
        if load {
            store.load()?;
        }
        info!(path = %path.display(), segments = store.len(), "opened segment store");
        Ok(store)
    }

    /// Creates an empty store over the given backend.
    ///
    /// Nothing is read from the backend; call [`SegmentStore::load`] to pick
    /// up persisted segments.
    pub fn with_backend(config: StoreConfig, backend: Box<dyn SegmentBackend>) -> Self {
        Self {
            config,
            state: RwLock::new(StoreState {
                segments: SegmentMap::new(),
                index: IndexManager::new(),
                backend,
            }),
            stats: OperationStats::new(),
        }
    }

    /// Creates an empty, non-persistent store.
    pub fn in_memory() -> Self {
        Self::with_backend(
            StoreConfig::default().load_on_open(false),
            Box::new(InMemoryBackend::new()),
        )
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Inserts a segment, replacing any segment with the same ID.
    ///
    /// A replaced segment moves to the end of the insertion order.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] for an empty ID or non-finite index value
    /// - [`CoreError::Compile`] if the filter does not compile
    /// - [`CoreError::Storage`] if the backend rejects the write
    ///
    /// The store is unchanged on error.
    pub fn add(&self, segment: Segment) -> CoreResult<()> {
        let result = self.add_inner(segment);
        self.track(result)
    }

    fn add_inner(&self, segment: Segment) -> CoreResult<()> {
        let compiled = CompiledSegment::prepare(segment)?;

        let mut state = self.state.write();
        if let Err(e) = state.backend.save(&compiled.to_record()) {
            warn!(id = %compiled.id, error = %e, "failed to persist segment");
            return Err(e.into());
        }

        let replaced = state.segments.contains_key(&compiled.id);
        state
            .index
            .index_segment(&compiled.id, &compiled.segment.indexes, true);
        debug!(id = %compiled.id, replaced, "added segment");
        state.segments.insert(Arc::clone(&compiled.id), compiled);

        self.stats.record_write();
        Ok(())
    }

    /// Removes a segment.
    ///
    /// A backend that no longer holds the record is not an error; the
    /// segment is still dropped from memory.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no such segment exists
    /// - [`CoreError::Storage`] if the backend fails; the store is unchanged
    pub fn delete(&self, id: &str) -> CoreResult<()> {
        let result = self.delete_inner(id);
        self.track(result)
    }

    fn delete_inner(&self, id: &str) -> CoreResult<()> {
        let mut state = self.state.write();
        if !state.segments.contains_key(id) {
            return Err(CoreError::not_found(id));
        }

        match state.backend.delete(id) {
            Ok(()) => {}
            Err(StorageError::Missing(_)) => {
                warn!(id, "segment was not persisted, removing from memory only");
            }
            Err(e) => {
                warn!(id, error = %e, "failed to delete persisted segment");
                return Err(e.into());
            }
        }

        state.index.deindex(id);
        state.segments.remove(id);
        debug!(id, "deleted segment");

        self.stats.record_delete();
        Ok(())
    }

    /// Replaces the whole store with `segments`.
    ///
    /// Every segment is validated and compiled before storage is touched.
    /// When an ID repeats, the last occurrence wins and the first fixes its
    /// position. Returns the number of segments now stored.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] or [`CoreError::Compile`] before any write
    /// - [`CoreError::Storage`] if clearing or saving fails
    ///
    /// On a storage failure the in-memory store keeps its previous contents,
    /// but the backend is cleared (best effort) and may hold nothing.
    pub fn publish<I>(&self, segments: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = Segment>,
    {
        let result = self.publish_inner(segments);
        self.track(result)
    }

    fn publish_inner<I>(&self, segments: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = Segment>,
    {
        let mut compiled: Vec<CompiledSegment> = Vec::new();
        let mut positions: HashMap<Arc<str>, usize> = HashMap::new();
        for segment in segments {
            let entry = CompiledSegment::prepare(segment)?;
            match positions.get(&entry.id) {
                Some(&pos) => compiled[pos] = entry,
                None => {
                    positions.insert(Arc::clone(&entry.id), compiled.len());
                    compiled.push(entry);
                }
            }
        }

        let mut state = self.state.write();
        if let Err(e) = state.backend.clear() {
            warn!(error = %e, "failed to clear backend before publish");
            return Err(e.into());
        }

        for entry in &compiled {
            if let Err(e) = state.backend.save(&entry.to_record()) {
                warn!(id = %entry.id, error = %e, "publish failed, clearing backend");
                if let Err(rollback) = state.backend.clear() {
                    warn!(error = %rollback, "failed to clear backend after publish failure");
                }
                return Err(e.into());
            }
        }

        let count = compiled.len();
        state.replace(compiled);
        info!(segments = count, "published segments");

        self.stats.record_publish();
        Ok(count)
    }

    /// Replaces the in-memory store with the backend's contents.
    ///
    /// Returns the number of segments loaded. The index is rebuilt in
    /// ascending ID order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or a stored segment is
    /// invalid. The store is unchanged on error.
    pub fn load(&self) -> CoreResult<usize> {
        let result = self.load_inner();
        self.track(result)
    }

    fn load_inner(&self) -> CoreResult<usize> {
        let mut state = self.state.write();
        let records = state.backend.load()?;
        let compiled = records
            .into_values()
            .map(|record| CompiledSegment::prepare(Segment::from(record)))
            .collect::<CoreResult<Vec<_>>>()?;

        let count = compiled.len();
        state.replace(compiled);
        info!(segments = count, "loaded segments");

        self.stats.record_load();
        Ok(count)
    }

    /// Returns the segment with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such segment exists.
    pub fn get(&self, id: &str) -> CoreResult<Arc<Segment>> {
        self.stats.record_read();
        let found = self
            .state
            .read()
            .segments
            .get(id)
            .map(|entry| Arc::clone(&entry.segment));
        self.track(found.ok_or_else(|| CoreError::not_found(id)))
    }

    /// Returns the segments with the given IDs, in request order.
    ///
    /// Unknown IDs are skipped.
    pub fn get_all<I, S>(&self, ids: I) -> Vec<Arc<Segment>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stats.record_read();
        let state = self.state.read();
        ids.into_iter()
            .filter_map(|id| state.segments.get(id.as_ref()))
            .map(|entry| Arc::clone(&entry.segment))
            .collect()
    }

    /// Lists segments matching any pair of `filter`.
    ///
    /// An empty filter lists every segment in insertion order. A `limit`
    /// below 1 means unlimited; `offset` is clamped to the candidate count.
    pub fn list(&self, filter: &IndexFilter, limit: i64, offset: i64) -> Vec<Arc<Segment>> {
        self.stats.record_query();
        if !filter.is_empty() {
            self.stats.record_index_lookup();
        }
        let state = self.state.read();
        QueryEngine::new(&state.segments, &state.index).list(filter, limit, offset)
    }

    /// Returns segments whose filter matches `attrs`.
    ///
    /// Attributes naming a known index select candidates by exact match and
    /// are not visible to filters. A positive `limit` caps the result.
    pub fn query<S: BuildHasher>(
        &self,
        attrs: &HashMap<String, Value, S>,
        limit: i64,
    ) -> Vec<Arc<Segment>> {
        self.stats.record_query();
        let state = self.state.read();
        let outcome = QueryEngine::new(&state.segments, &state.index).query(attrs, limit);
        drop(state);

        match outcome.plan {
            QueryPlan::IndexLookup => self.stats.record_index_lookup(),
            QueryPlan::FullScan => {
                self.stats.record_scan();
                let threshold = self.config.scan_warning_threshold;
                if threshold > 0 && outcome.candidates > threshold {
                    warn!(
                        candidates = outcome.candidates,
                        threshold, "query matched no index, evaluated every segment"
                    );
                }
            }
        }
        debug!(
            plan = ?outcome.plan,
            candidates = outcome.candidates,
            matched = outcome.segments.len(),
            "query finished"
        );
        outcome.segments
    }

    /// Returns true if a segment with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.state.read().segments.contains_key(id)
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.state.read().segments.len()
    }

    /// Returns true if the store holds no segments.
    pub fn is_empty(&self) -> bool {
        self.state.read().segments.is_empty()
    }

    /// Returns size and operation statistics.
    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        StoreStats {
            segments: state.segments.len(),
            index_attributes: state.index.attribute_count(),
            index_buckets: state.index.bucket_count(),
            index_entries: state.index.entry_count(),
            index_footprint: state.index.footprint(),
            ops: self.stats.snapshot(),
        }
    }

    /// Checks the index against the segment map.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexDrift`] describing the first difference.
    pub fn verify(&self) -> CoreResult<()> {
        let state = self.state.read();

        if let Some(id) = state.index.ids().find(|id| !state.segments.contains_key(*id)) {
            return Err(CoreError::index_drift(format!(
                "indexed ID {id:?} has no segment"
            )));
        }
        if state.index.len() != state.segments.len() {
            return Err(CoreError::index_drift(format!(
                "{} segments but {} indexed IDs",
                state.segments.len(),
                state.index.len()
            )));
        }

        let mut expected = IndexManager::new();
        expected.rebuild(state.index.ids().filter_map(|id| {
            state
                .segments
                .get(id)
                .map(|entry| (&entry.id, &entry.segment.indexes))
        }));

        match state.index.first_difference(&expected) {
            Some(message) => Err(CoreError::index_drift(message)),
            None => Ok(()),
        }
    }

    fn track<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if result.is_err() {
            self.stats.record_error();
        }
        result
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStore")
            .field("config", &self.config)
            .field("segments", &self.len())
            .finish_non_exhaustive()
    }
}
