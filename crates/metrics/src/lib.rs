//! LWES Metrics - operational counters and periodic reporting
//!
//! Receivers and emitters expose their counters through the provider
//! traits here, and the [`MetricsReporter`] collects a consistent
//! snapshot of every registered provider at a fixed interval, hands it
//! to an optional user callback, and logs a summary line per component.
//!
//! # Design
//!
//! - Providers are `Send + Sync`; metric structs use atomics internally,
//!   so taking a snapshot never blocks the hot path
//! - Snapshot types are plain `Copy` structs and `serde::Serialize`, so
//!   callers can forward them to any stats backend

mod reporter;
mod traits;

pub use reporter::{CollectedMetrics, MetricsReporter, MetricsReporterBuilder, ReporterConfig};
pub use traits::{
    EmitterMetricsProvider, EmitterMetricsSnapshot, ReceiverMetricsProvider,
    ReceiverMetricsSnapshot,
};
