//! Metrics provider traits
//!
//! Components expose their counters through these traits so the
//! reporter can collect them without knowing the concrete types.

/// Point-in-time snapshot of receiver counters
///
/// `queue_size` and `packet_size` are gauges; everything else is a
/// monotonic counter since the receiver was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReceiverMetricsSnapshot {
    /// Buffers enqueued and not yet released by a consumer
    pub queue_size: u64,
    /// Size of the most recently received datagram
    pub packet_size: u64,
    pub bytes_received: u64,
    pub bytes_dropped: u64,
    pub packets_received: u64,
    /// Datagrams dropped because the buffer queue was full
    pub packets_dropped: u64,
    /// Datagrams successfully enqueued for consumers
    pub packets_processed: u64,
    /// Datagrams that failed to decode
    pub packets_invalid: u64,
    /// Datagrams decoded into events
    pub packets_decoded: u64,
    /// Decoded events handed to the event queue
    pub packets_decoded_passed: u64,
    /// Decoded events dropped because the event queue was full
    pub packets_dropped_decoded: u64,
    pub read_error: u64,
    pub read_timeout: u64,
}

/// Trait for receivers to provide metrics to the reporter
pub trait ReceiverMetricsProvider: Send + Sync {
    /// Unique identifier for this receiver instance
    fn receiver_id(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> ReceiverMetricsSnapshot;
}

/// Point-in-time snapshot of emitter counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EmitterMetricsSnapshot {
    /// Events passed to `emit`
    pub events_emitted: u64,
    /// Bytes successfully written, summed over destinations
    pub bytes_emitted: u64,
    /// Per-destination write failures
    pub write_errors: u64,
    /// Destinations currently open
    pub destinations_active: u64,
}

/// Trait for emitters to provide metrics to the reporter
pub trait EmitterMetricsProvider: Send + Sync {
    /// Unique identifier for this emitter instance
    fn emitter_id(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> EmitterMetricsSnapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_default_to_zero() {
        let r = ReceiverMetricsSnapshot::default();
        assert_eq!(r.packets_received, 0);
        assert_eq!(r.queue_size, 0);

        let e = EmitterMetricsSnapshot::default();
        assert_eq!(e.events_emitted, 0);
        assert_eq!(e.destinations_active, 0);
    }
}
