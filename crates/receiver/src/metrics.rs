//! Receiver counters
//!
//! Per-field atomics updated from the read loop and decoder workers;
//! the reporter takes snapshots without touching the hot path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lwes_metrics::{ReceiverMetricsProvider, ReceiverMetricsSnapshot};

/// Mutable counter record for one receiver
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    /// Gauge: buffers enqueued and not yet released
    pub queue_size: AtomicU64,
    /// Gauge: size of the most recent datagram
    pub packet_size: AtomicU64,
    pub bytes_received: AtomicU64,
    pub bytes_dropped: AtomicU64,
    pub packets_received: AtomicU64,
    pub packets_dropped: AtomicU64,
    pub packets_processed: AtomicU64,
    pub packets_invalid: AtomicU64,
    pub packets_decoded: AtomicU64,
    pub packets_decoded_passed: AtomicU64,
    pub packets_dropped_decoded: AtomicU64,
    pub read_error: AtomicU64,
    pub read_timeout: AtomicU64,
}

impl ReceiverMetrics {
    pub const fn new() -> Self {
        Self {
            queue_size: AtomicU64::new(0),
            packet_size: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_dropped: AtomicU64::new(0),
            packets_received: AtomicU64::new(0),
            packets_dropped: AtomicU64::new(0),
            packets_processed: AtomicU64::new(0),
            packets_invalid: AtomicU64::new(0),
            packets_decoded: AtomicU64::new(0),
            packets_decoded_passed: AtomicU64::new(0),
            packets_dropped_decoded: AtomicU64::new(0),
            read_error: AtomicU64::new(0),
            read_timeout: AtomicU64::new(0),
        }
    }

    /// Record a successful socket read of `bytes` bytes
    #[inline]
    pub fn packet_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.packet_size.store(bytes, Ordering::Relaxed);
    }

    /// Record a buffer accepted by the queue; `queue` is the in-flight
    /// count after the enqueue
    #[inline]
    pub fn packet_processed(&self, queue: u64) {
        self.packets_processed.fetch_add(1, Ordering::Relaxed);
        self.queue_size.store(queue, Ordering::Relaxed);
    }

    /// Record a datagram dropped because the queue was full
    #[inline]
    pub fn packet_dropped(&self, bytes: u64) {
        self.bytes_dropped.fetch_add(bytes, Ordering::Relaxed);
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn packet_invalid(&self) {
        self.packets_invalid.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn packet_decoded(&self) {
        self.packets_decoded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn packet_decoded_passed(&self) {
        self.packets_decoded_passed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn packet_dropped_decoded(&self) {
        self.packets_dropped_decoded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn read_error(&self) {
        self.read_error.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn read_timeout(&self) {
        self.read_timeout.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> ReceiverMetricsSnapshot {
        ReceiverMetricsSnapshot {
            queue_size: self.queue_size.load(Ordering::Relaxed),
            packet_size: self.packet_size.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            packets_processed: self.packets_processed.load(Ordering::Relaxed),
            packets_invalid: self.packets_invalid.load(Ordering::Relaxed),
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            packets_decoded_passed: self.packets_decoded_passed.load(Ordering::Relaxed),
            packets_dropped_decoded: self.packets_dropped_decoded.load(Ordering::Relaxed),
            read_error: self.read_error.load(Ordering::Relaxed),
            read_timeout: self.read_timeout.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing receiver metrics
///
/// Implements [`ReceiverMetricsProvider`] for registration with the
/// metrics reporter; remains valid while the receiver runs.
#[derive(Debug, Clone)]
pub struct ReceiverMetricsHandle {
    id: String,
    metrics: Arc<ReceiverMetrics>,
}

impl ReceiverMetricsHandle {
    pub(crate) fn new(id: String, metrics: Arc<ReceiverMetrics>) -> Self {
        Self { id, metrics }
    }
}

impl ReceiverMetricsProvider for ReceiverMetricsHandle {
    fn receiver_id(&self) -> &str {
        &self.id
    }

    fn snapshot(&self) -> ReceiverMetricsSnapshot {
        self.metrics.snapshot()
    }
}
