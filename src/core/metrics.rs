//! Batch handler metrics
//!
//! Counters describing how a batching handler drains its backlog, useful for
//! spotting a destination that keeps failing while nobody is watching the
//! background flusher.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a batching handler
///
/// # Example
///
/// ```
/// use rust_log_facade::core::BatchMetrics;
///
/// let metrics = BatchMetrics::new();
/// metrics.record_flush(3, 0);
/// metrics.record_flush(1, 2);
///
/// assert_eq!(metrics.flushes(), 2);
/// assert_eq!(metrics.flushed_count(), 4);
/// assert_eq!(metrics.dropped_count(), 2);
/// assert_eq!(metrics.flush_failures(), 1);
/// ```
#[derive(Debug)]
pub struct BatchMetrics {
    /// Records delivered to the inner handler
    flushed_count: AtomicU64,

    /// Records discarded because an earlier record of the same flush failed
    dropped_count: AtomicU64,

    /// Flushes that stopped on an error
    flush_failures: AtomicU64,

    /// Non-empty flushes performed
    flushes: AtomicU64,
}

impl BatchMetrics {
    pub const fn new() -> Self {
        Self {
            flushed_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn flushed_count(&self) -> u64 {
        self.flushed_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Record one flush: `delivered` records reached the inner handler and
    /// `dropped` were discarded after a failure.
    ///
    /// The failing record itself counts as dropped.
    pub fn record_flush(&self, delivered: u64, dropped: u64) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.flushed_count.fetch_add(delivered, Ordering::Relaxed);
        if dropped > 0 {
            self.dropped_count.fetch_add(dropped, Ordering::Relaxed);
            self.flush_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Share of buffered records that were dropped, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been flushed yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.flushed_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.flushed_count.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.flush_failures.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
    }
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BatchMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            flushed_count: AtomicU64::new(self.flushed_count()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            flush_failures: AtomicU64::new(self.flush_failures()),
            flushes: AtomicU64::new(self.flushes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = BatchMetrics::new();
        assert_eq!(metrics.flushed_count(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.flush_failures(), 0);
        assert_eq!(metrics.flushes(), 0);
    }

    #[test]
    fn test_successful_flush_is_not_a_failure() {
        let metrics = BatchMetrics::new();
        metrics.record_flush(5, 0);
        assert_eq!(metrics.flushed_count(), 5);
        assert_eq!(metrics.flush_failures(), 0);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = BatchMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        metrics.record_flush(75, 25);
        assert!((metrics.drop_rate() - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = BatchMetrics::new();
        metrics.record_flush(2, 1);

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(snapshot.flushed_count(), 2);
        assert_eq!(snapshot.dropped_count(), 1);
        assert_eq!(metrics.flushed_count(), 0);
        assert_eq!(metrics.flushes(), 0);
    }
}
