//! Periodic metrics reporter
//!
//! Collects snapshots from all registered providers at the configured
//! interval, passes the collection to an optional user callback, and
//! logs one summary line per component via `tracing`.
//!
//! The callback is how applications forward counters to an external
//! stats system; the log lines cover the common case of just wanting
//! the numbers somewhere visible.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::traits::{
    EmitterMetricsProvider, EmitterMetricsSnapshot, ReceiverMetricsProvider,
    ReceiverMetricsSnapshot,
};

/// Reporter configuration
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Whether periodic reporting runs at all
    pub enabled: bool,
    /// Snapshot interval
    pub interval: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(10),
        }
    }
}

/// One collection round: a snapshot of every registered provider
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CollectedMetrics {
    pub receivers: Vec<(String, ReceiverMetricsSnapshot)>,
    pub emitters: Vec<(String, EmitterMetricsSnapshot)>,
}

type ReportCallback = dyn Fn(&CollectedMetrics) + Send + Sync;

/// Builder for constructing a [`MetricsReporter`]
#[derive(Default)]
pub struct MetricsReporterBuilder {
    config: Option<ReporterConfig>,
    receivers: Vec<Arc<dyn ReceiverMetricsProvider>>,
    emitters: Vec<Arc<dyn EmitterMetricsProvider>>,
    callback: Option<Box<ReportCallback>>,
}

impl MetricsReporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reporter configuration
    pub fn config(mut self, config: ReporterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a receiver metrics provider
    pub fn receiver(mut self, provider: Arc<dyn ReceiverMetricsProvider>) -> Self {
        self.receivers.push(provider);
        self
    }

    /// Register an emitter metrics provider
    pub fn emitter(mut self, provider: Arc<dyn EmitterMetricsProvider>) -> Self {
        self.emitters.push(provider);
        self
    }

    /// Set a callback invoked with every collection round
    pub fn on_report<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CollectedMetrics) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> MetricsReporter {
        MetricsReporter {
            config: self.config.unwrap_or_default(),
            receivers: self.receivers,
            emitters: self.emitters,
            callback: self.callback,
        }
    }
}

/// Periodic metrics reporter
///
/// Spawn [`MetricsReporter::run`] as a task; it ticks until the
/// cancellation token fires.
pub struct MetricsReporter {
    config: ReporterConfig,
    receivers: Vec<Arc<dyn ReceiverMetricsProvider>>,
    emitters: Vec<Arc<dyn EmitterMetricsProvider>>,
    callback: Option<Box<ReportCallback>>,
}

impl MetricsReporter {
    pub fn builder() -> MetricsReporterBuilder {
        MetricsReporterBuilder::new()
    }

    /// Run the reporter until cancellation
    pub async fn run(self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            receivers = self.receivers.len(),
            emitters = self.emitters.len(),
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Collect and report metrics once
    fn report(&self) {
        let metrics = self.collect();

        if let Some(callback) = &self.callback {
            callback(&metrics);
        }

        for (id, s) in &metrics.receivers {
            info!(
                receiver = %id,
                queue_size = s.queue_size,
                packets_received = s.packets_received,
                packets_processed = s.packets_processed,
                packets_dropped = s.packets_dropped,
                packets_invalid = s.packets_invalid,
                packets_decoded = s.packets_decoded,
                bytes_received = s.bytes_received,
                read_timeouts = s.read_timeout,
                read_errors = s.read_error,
                "receiver metrics"
            );
        }

        for (id, s) in &metrics.emitters {
            info!(
                emitter = %id,
                events_emitted = s.events_emitted,
                bytes_emitted = s.bytes_emitted,
                write_errors = s.write_errors,
                destinations_active = s.destinations_active,
                "emitter metrics"
            );
        }
    }

    /// Snapshot every registered provider
    fn collect(&self) -> CollectedMetrics {
        CollectedMetrics {
            receivers: self
                .receivers
                .iter()
                .map(|r| (r.receiver_id().to_string(), r.snapshot()))
                .collect(),
            emitters: self
                .emitters
                .iter()
                .map(|e| (e.emitter_id().to_string(), e.snapshot()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct TestReceiver {
        id: String,
        packets: AtomicU64,
    }

    impl ReceiverMetricsProvider for TestReceiver {
        fn receiver_id(&self) -> &str {
            &self.id
        }

        fn snapshot(&self) -> ReceiverMetricsSnapshot {
            ReceiverMetricsSnapshot {
                packets_received: self.packets.load(Ordering::Relaxed),
                ..Default::default()
            }
        }
    }

    struct TestEmitter {
        id: String,
    }

    impl EmitterMetricsProvider for TestEmitter {
        fn emitter_id(&self) -> &str {
            &self.id
        }

        fn snapshot(&self) -> EmitterMetricsSnapshot {
            EmitterMetricsSnapshot {
                events_emitted: 7,
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_builder_defaults() {
        let reporter = MetricsReporter::builder().build();
        assert!(reporter.config.enabled);
        assert_eq!(reporter.config.interval, Duration::from_secs(10));
        assert!(reporter.receivers.is_empty());
        assert!(reporter.emitters.is_empty());
    }

    #[test]
    fn test_collect_with_providers() {
        let receiver = Arc::new(TestReceiver {
            id: "udp".into(),
            packets: AtomicU64::new(42),
        });
        let emitter = Arc::new(TestEmitter { id: "fanout".into() });

        let reporter = MetricsReporter::builder()
            .receiver(receiver)
            .emitter(emitter)
            .build();

        let metrics = reporter.collect();
        assert_eq!(metrics.receivers.len(), 1);
        assert_eq!(metrics.receivers[0].0, "udp");
        assert_eq!(metrics.receivers[0].1.packets_received, 42);
        assert_eq!(metrics.emitters.len(), 1);
        assert_eq!(metrics.emitters[0].1.events_emitted, 7);
    }

    #[tokio::test]
    async fn test_run_disabled_returns_immediately() {
        let config = ReporterConfig {
            enabled: false,
            ..Default::default()
        };
        let reporter = MetricsReporter::builder().config(config).build();
        reporter.run(CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn test_callback_receives_snapshots() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let receiver = Arc::new(TestReceiver {
            id: "udp".into(),
            packets: AtomicU64::new(3),
        });

        let config = ReporterConfig {
            enabled: true,
            interval: Duration::from_millis(10),
        };

        let reporter = MetricsReporter::builder()
            .config(config)
            .receiver(receiver)
            .on_report(move |m| {
                let mut seen = seen_clone.lock().unwrap();
                seen.push(m.receivers[0].1.packets_received);
            })
            .build();

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            cancel_clone.cancel();
        });

        reporter.run(cancel).await;

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&p| p == 3));
    }
}
