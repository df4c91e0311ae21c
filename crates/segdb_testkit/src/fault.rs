//! Fault injection for storage backends.
//!
//! [`FailingBackend`] wraps any backend and fails selected operations on
//! demand. The store owns the backend, so failures are switched through a
//! [`FaultHandle`] kept by the test.
//!
//! ```rust
//! use segdb_core::{Segment, SegmentStore, StoreConfig};
//! use segdb_storage::InMemoryBackend;
//! use segdb_testkit::FailingBackend;
//!
//! let (backend, faults) = FailingBackend::new(InMemoryBackend::new());
//! let store = SegmentStore::with_backend(StoreConfig::default(), Box::new(backend));
//!
//! faults.fail_saves();
//! assert!(store.add(Segment::new("a", "true")).is_err());
//! assert!(store.is_empty());
//! ```

use segdb_codec::SegmentRecord;
use segdb_storage::{SegmentBackend, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const UNLIMITED: usize = usize::MAX;

#[derive(Debug)]
struct Faults {
    /// Saves still allowed before failing.
    save_budget: AtomicUsize,
    fail_delete: AtomicBool,
    fail_clear: AtomicBool,
    fail_load: AtomicBool,
    saves: AtomicUsize,
    deletes: AtomicUsize,
    clears: AtomicUsize,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            save_budget: AtomicUsize::new(UNLIMITED),
            fail_delete: AtomicBool::new(false),
            fail_clear: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }
}

/// Switches failures on and off for a [`FailingBackend`].
#[derive(Debug, Clone)]
pub struct FaultHandle {
    faults: Arc<Faults>,
}

impl FaultHandle {
    /// Makes every following save fail.
    pub fn fail_saves(&self) {
        self.fail_saves_after(0);
    }

    /// Lets `count` more saves succeed, then fails the rest.
    pub fn fail_saves_after(&self, count: usize) {
        self.faults.save_budget.store(count, Ordering::SeqCst);
    }

    /// Sets whether deletes fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.faults.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Sets whether clears fail.
    pub fn set_fail_clears(&self, fail: bool) {
        self.faults.fail_clear.store(fail, Ordering::SeqCst);
    }

    /// Sets whether loads fail.
    pub fn set_fail_loads(&self, fail: bool) {
        self.faults.fail_load.store(fail, Ordering::SeqCst);
    }

    /// Clears every injected failure. Counters are kept.
    pub fn reset(&self) {
        self.faults.save_budget.store(UNLIMITED, Ordering::SeqCst);
        self.set_fail_deletes(false);
        self.set_fail_clears(false);
        self.set_fail_loads(false);
    }

    /// Successful saves so far.
    pub fn saves(&self) -> usize {
        self.faults.saves.load(Ordering::SeqCst)
    }

    /// Successful deletes so far.
    pub fn deletes(&self) -> usize {
        self.faults.deletes.load(Ordering::SeqCst)
    }

    /// Clear attempts so far, failed ones included.
    pub fn clears(&self) -> usize {
        self.faults.clears.load(Ordering::SeqCst)
    }
}

/// A backend wrapper that fails operations on request.
pub struct FailingBackend<B> {
    inner: B,
    faults: Arc<Faults>,
}

impl<B: SegmentBackend> FailingBackend<B> {
    /// Wraps `inner`, returning the backend and its control handle.
    pub fn new(inner: B) -> (Self, FaultHandle) {
        let faults = Arc::new(Faults::default());
        let handle = FaultHandle {
            faults: Arc::clone(&faults),
        };
        (Self { inner, faults }, handle)
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn injected(operation: &str) -> StorageError {
        StorageError::Unavailable(format!("injected {operation} failure"))
    }

    fn take_save_permit(&self) -> bool {
        self.faults
            .save_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| match budget {
                0 => None,
                UNLIMITED => Some(UNLIMITED),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl<B: SegmentBackend> SegmentBackend for FailingBackend<B> {
    fn save(&mut self, record: &SegmentRecord) -> StorageResult<()> {
        if !self.take_save_permit() {
            return Err(Self::injected("save"));
        }
        self.inner.save(record)?;
        self.faults.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        if self.faults.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::injected("delete"));
        }
        self.inner.delete(id)?;
        self.faults.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.faults.clears.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_clear.load(Ordering::SeqCst) {
            return Err(Self::injected("clear"));
        }
        self.inner.clear()
    }

    fn load(&self) -> StorageResult<BTreeMap<String, SegmentRecord>> {
        if self.faults.fail_load.load(Ordering::SeqCst) {
            return Err(Self::injected("load"));
        }
        self.inner.load()
    }
}
