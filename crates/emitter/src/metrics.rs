//! Emitter counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lwes_metrics::{EmitterMetricsProvider, EmitterMetricsSnapshot};

/// Mutable counter record for one emitter
#[derive(Debug, Default)]
pub struct EmitterMetrics {
    /// Events passed to `emit`
    pub events_emitted: AtomicU64,
    /// Bytes successfully written, summed over destinations
    pub bytes_emitted: AtomicU64,
    /// Per-destination write failures
    pub write_errors: AtomicU64,
    /// Destinations currently open
    pub destinations_active: AtomicU64,
}

impl EmitterMetrics {
    pub const fn new() -> Self {
        Self {
            events_emitted: AtomicU64::new(0),
            bytes_emitted: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            destinations_active: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn event_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn bytes_written(&self, bytes: u64) {
        self.bytes_emitted.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_destinations(&self, count: u64) {
        self.destinations_active.store(count, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> EmitterMetricsSnapshot {
        EmitterMetricsSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            bytes_emitted: self.bytes_emitted.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            destinations_active: self.destinations_active.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing emitter metrics
///
/// Implements [`EmitterMetricsProvider`] for registration with the
/// metrics reporter.
#[derive(Debug, Clone)]
pub struct EmitterMetricsHandle {
    id: String,
    metrics: Arc<EmitterMetrics>,
}

impl EmitterMetricsHandle {
    pub(crate) fn new(id: String, metrics: Arc<EmitterMetrics>) -> Self {
        Self { id, metrics }
    }
}

impl EmitterMetricsProvider for EmitterMetricsHandle {
    fn emitter_id(&self) -> &str {
        &self.id
    }

    fn snapshot(&self) -> EmitterMetricsSnapshot {
        self.metrics.snapshot()
    }
}
