//! Stress tests for SegDB.
//!
//! These drive a shared store from several threads and check that the
//! index still agrees with the segment map afterwards.

use crate::fixtures::sample_segment;
use segdb_codec::Value;
use segdb_core::{IndexFilter, SegmentStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
    /// Whether the index verified after the run.
    pub consistent: bool,
}

impl StressResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration, consistent: bool) -> Self {
        let total = successful + failed;
        let secs = duration.as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let ops_per_second = if secs > 0.0 { total as f64 / secs } else { 0.0 };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
            consistent,
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
        println!("Consistent: {}", self.consistent);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations across all threads.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Number of distinct segment IDs.
    pub id_space: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            id_space: 100,
        }
    }
}

impl StressConfig {
    fn ops_per_thread(&self) -> usize {
        self.operations / self.threads.max(1)
    }
}

fn run_threads<F>(config: &StressConfig, op: F) -> (usize, usize, Duration)
where
    F: Fn(usize) -> bool + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.ops_per_thread();

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads.max(1))
        .map(|t| {
            let op = Arc::clone(&op);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    if op(t * ops_per_thread + i) {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    (
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Runs adds, deletes, reads, lists and queries concurrently.
///
/// Each operation index picks both the segment and the kind of operation,
/// so runs are repeatable apart from thread interleaving. Deleting a
/// missing segment counts as a success.
pub fn stress_concurrent_mixed(store: Arc<SegmentStore>, config: &StressConfig) -> StressResult {
    let id_space = config.id_space.max(1);
    let target = Arc::clone(&store);

    let (successful, failed, duration) = run_threads(config, move |n| {
        let i = n % id_space;
        let id = format!("seg{i}");
        match n % 5 {
            0 | 1 => target.add(sample_segment(i)).is_ok(),
            2 => match target.delete(&id) {
                Ok(()) => true,
                Err(e) => e.is_not_found(),
            },
            3 => {
                let mut filter = IndexFilter::new();
                filter.insert("idx1".to_string(), Value::Integer(i64::try_from(i % 3).unwrap_or(0)));
                target
                    .list(&filter, 10, 0)
                    .iter()
                    .all(|s| s.indexes.get("idx1") == filter.get("idx1"))
            }
            _ => {
                let found = target.get(&id);
                found.is_ok() || found.is_err_and(|e| e.is_not_found())
            }
        }
    });

    StressResult::new(successful, failed, duration, store.verify().is_ok())
}

/// Runs filter queries from several threads against a populated store.
///
/// Every sample segment matches the context used here, so each query
/// must return exactly one segment.
pub fn stress_concurrent_queries(store: Arc<SegmentStore>, config: &StressConfig) -> StressResult {
    let id_space = config.id_space.max(1);
    for i in 0..id_space {
        let _ = store.add(sample_segment(i));
    }
    let target = Arc::clone(&store);

    let (successful, failed, duration) = run_threads(config, move |n| {
        let i = n % id_space;
        let mut attrs = HashMap::new();
        attrs.insert("level".to_string(), Value::Integer(2));
        attrs.insert("uvs".to_string(), Value::Integer(1));
        attrs.insert("idx2".to_string(), Value::Text(format!("idx2_{i}")));

        let found = target.query(&attrs, 0);
        found.len() == 1 && found[0].id == format!("seg{i}")
    });

    StressResult::new(successful, failed, duration, store.verify().is_ok())
}
