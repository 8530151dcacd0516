//! Batching handler
//!
//! Accumulates records and hands them to an inner handler either when the
//! backlog reaches a size threshold or on a periodic timer. The timer thread
//! is started lazily on first use, at most once per handler, and stopped by
//! [`BatchHandler::shutdown`] or when the last handle is dropped.

use crate::core::{Attr, BatchMetrics, Handler, Level, LoggerError, Record, Result};
use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Flush triggers of a [`BatchHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Backlog length that triggers a synchronous flush; 0 disables
    pub size: usize,
    /// Period of the background flush; zero disables
    pub interval: Duration,
}

impl BatchConfig {
    pub const fn new(size: usize, interval: Duration) -> Self {
        Self { size, interval }
    }

    /// Flush only when `size` records are pending.
    pub const fn by_size(size: usize) -> Self {
        Self::new(size, Duration::ZERO)
    }

    /// Flush only on a timer.
    pub const fn by_interval(interval: Duration) -> Self {
        Self::new(0, interval)
    }

    /// Reject a configuration with neither trigger, which would only ever
    /// deliver on an explicit flush or on drop.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 && self.interval.is_zero() {
            return Err(LoggerError::config(
                "BatchConfig",
                "size and interval are both zero; records would never be flushed automatically",
            ));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(1))
    }
}

struct Flusher {
    stop: Sender<()>,
    handle: thread::JoinHandle<()>,
}

struct BatchShared {
    inner: Arc<dyn Handler>,
    config: BatchConfig,
    /// Records accepted by `handle`; locked only to push or to swap out.
    backlog: Mutex<Vec<Record>>,
    /// Batch being delivered. Holding it serializes drains, so batches reach
    /// the inner handler in FIFO order; between drains it is an empty spare.
    in_flight: Mutex<Vec<Record>>,
    started: AtomicBool,
    flusher: Mutex<Option<Flusher>>,
    metrics: BatchMetrics,
}

impl BatchShared {
    fn flush(&self) -> Result<()> {
        let mut batch = self.in_flight.lock();
        std::mem::swap(&mut *self.backlog.lock(), &mut *batch);
        drain(&*self.inner, &self.metrics, &mut batch)
    }
}

impl Drop for BatchShared {
    fn drop(&mut self) {
        // Dropping the flusher's sender disconnects its stop channel.
        self.flusher.get_mut().take();
        if let Err(e) = drain(&*self.inner, &self.metrics, self.backlog.get_mut()) {
            eprintln!("[LOGGER ERROR] Batch flush on drop failed: {}", e);
        }
    }
}

/// Deliver the backlog in order, stopping at the first error or panic.
///
/// The backlog is cleared either way, keeping its capacity; records after a
/// failing one are dropped.
fn drain(inner: &dyn Handler, metrics: &BatchMetrics, backlog: &mut Vec<Record>) -> Result<()> {
    if backlog.is_empty() {
        return Ok(());
    }

    let total = backlog.len();
    let mut delivered = 0;
    let mut result = Ok(());
    for record in backlog.iter() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| inner.handle(record)));
        match outcome {
            Ok(Ok(())) => delivered += 1,
            Ok(Err(e)) => {
                result = Err(e);
                break;
            }
            Err(payload) => {
                result = Err(LoggerError::handler_panicked(0, &*payload));
                break;
            }
        }
    }

    metrics.record_flush(delivered as u64, (total - delivered) as u64);
    backlog.clear();
    result
}

/// Size- and time-triggered batching in front of another handler.
///
/// Clones share the backlog, the timer and the metrics.
#[derive(Clone)]
pub struct BatchHandler {
    shared: Arc<BatchShared>,
}

impl BatchHandler {
    pub fn new(inner: Arc<dyn Handler>, config: BatchConfig) -> Self {
        let capacity = config.size.min(1024);
        Self {
            shared: Arc::new(BatchShared {
                inner,
                config,
                backlog: Mutex::new(Vec::with_capacity(capacity)),
                in_flight: Mutex::new(Vec::with_capacity(capacity)),
                started: AtomicBool::new(false),
                flusher: Mutex::new(None),
                metrics: BatchMetrics::new(),
            }),
        }
    }

    pub fn config(&self) -> BatchConfig {
        self.shared.config
    }

    pub fn metrics(&self) -> &BatchMetrics {
        &self.shared.metrics
    }

    /// Number of records waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.shared.backlog.lock().len()
    }

    /// Whether both handles share one backlog.
    pub fn shares_backlog_with(&self, other: &BatchHandler) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Deliver every pending record now.
    pub fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    /// Stop the background timer, wait for it to exit, then flush what is left.
    ///
    /// The timer is not restarted afterwards; later records are delivered by
    /// size or by an explicit [`flush`](Self::flush).
    pub fn shutdown(&self) -> Result<()> {
        self.shared.started.store(true, Ordering::SeqCst);
        let flusher = self.shared.flusher.lock().take();
        if let Some(Flusher { stop, handle }) = flusher {
            let _ = stop.send(());
            drop(stop);
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Batch flusher thread panicked during shutdown");
            }
        }
        self.flush()
    }

    fn start_flusher(&self) {
        let interval = self.shared.config.interval;
        if interval.is_zero()
            || self
                .shared
                .started
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return;
        }

        let (stop, stopped) = bounded::<()>(1);
        let ticker = tick(interval);
        let weak: Weak<BatchShared> = Arc::downgrade(&self.shared);

        let spawned = thread::Builder::new()
            .name("log-batch-flusher".to_string())
            .spawn(move || loop {
                select! {
                    recv(stopped) -> _ => break,
                    recv(ticker) -> _ => {
                        let Some(shared) = weak.upgrade() else { break };
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.flush()));
                        match outcome {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                eprintln!("[LOGGER ERROR] Background batch flush failed: {}", e);
                            }
                            Err(_) => {
                                eprintln!("[LOGGER ERROR] Background batch flush panicked");
                            }
                        }
                    }
                }
            });

        match spawned {
            Ok(handle) => *self.shared.flusher.lock() = Some(Flusher { stop, handle }),
            Err(e) => eprintln!(
                "[LOGGER WARNING] Could not start batch flusher ({}); records flush by size only",
                e
            ),
        }
    }

    fn derive(&self, derive_inner: impl FnOnce(&dyn Handler) -> Arc<dyn Handler>) -> Arc<dyn Handler> {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Batch flush before derive failed: {}", e);
        }
        Arc::new(BatchHandler::new(
            derive_inner(&*self.shared.inner),
            self.shared.config,
        ))
    }
}

impl Handler for BatchHandler {
    fn enabled(&self, level: Level) -> bool {
        self.shared.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let size = self.shared.config.size;
        let full = {
            let mut backlog = self.shared.backlog.lock();
            backlog.push(record.clone());
            size > 0 && backlog.len() >= size
        };
        if full {
            return self.shared.flush();
        }
        self.start_flusher();
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler> {
        if attrs.is_empty() {
            return Arc::new(self.clone());
        }
        self.derive(|inner| inner.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        if name.is_empty() {
            return Arc::new(self.clone());
        }
        self.derive(|inner| inner.with_group(name))
    }

    fn name(&self) -> &str {
        "batch"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
