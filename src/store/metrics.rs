//! BucketKV - Store Metrics
//! Atomic counters for tracking store operations
//! in a lock-free, thread-safe manner using `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for the namespaced store.
///
/// All counters use `Ordering::Relaxed`; they are read for reporting only.
#[derive(Debug)]
pub struct StoreMetrics {
    /// Total number of `set` operations.
    pub sets: AtomicU64,
    /// Total number of `get` operations.
    pub gets: AtomicU64,
    /// `get` operations that found no value.
    pub get_misses: AtomicU64,
    /// Total number of `delete` operations.
    pub deletes: AtomicU64,
    /// Total number of bucket or key listings.
    pub lists: AtomicU64,
    /// Total bytes written (values stored by `set`).
    pub bytes_written: AtomicU64,
    /// Total bytes read (values returned by `get`).
    pub bytes_read: AtomicU64,
    /// Operations that failed inside the engine.
    pub storage_errors: AtomicU64,
    started: Instant,
}

impl StoreMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            sets: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            get_misses: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            lists: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            storage_errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_set(&self, value_size: usize) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(value_size as u64, Ordering::Relaxed);
    }

    /// Record a get; `None` is a miss.
    pub fn record_get(&self, value_size: Option<usize>) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        match value_size {
            Some(size) => {
                self.bytes_read.fetch_add(size as u64, Ordering::Relaxed);
            }
            None => {
                self.get_misses.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_list(&self) {
        self.lists.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Seconds since the store was opened.
    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Total number of operations (sets + gets + deletes + lists).
    pub fn total_ops(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
            + self.gets.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
            + self.lists.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "store metrics: sets={} gets={} (misses={}) deletes={} lists={} \
             written={}B read={}B storage_errors={} uptime={:.2}s",
            self.sets.load(Ordering::Relaxed),
            self.gets.load(Ordering::Relaxed),
            self.get_misses.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.lists.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed),
            self.storage_errors.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_operations() {
        let m = StoreMetrics::new();

        m.record_set(10);
        m.record_set(7);
        m.record_get(Some(10));
        m.record_get(None);
        m.record_delete();
        m.record_list();

        assert_eq!(m.sets.load(Ordering::Relaxed), 2);
        assert_eq!(m.gets.load(Ordering::Relaxed), 2);
        assert_eq!(m.get_misses.load(Ordering::Relaxed), 1);
        assert_eq!(m.deletes.load(Ordering::Relaxed), 1);
        assert_eq!(m.bytes_written.load(Ordering::Relaxed), 17);
        assert_eq!(m.bytes_read.load(Ordering::Relaxed), 10);
        assert_eq!(m.total_ops(), 6);
    }

    #[test]
    fn test_report_format() {
        let m = StoreMetrics::default();
        m.record_set(20);
        let report = m.report();
        assert!(report.contains("sets=1"));
        assert!(report.contains("written=20B"));
    }
}
