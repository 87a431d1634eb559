//! LWES Emitter - fan an encoded event out to UDP destinations
//!
//! An emitter owns one connected UDP socket per configured destination.
//! `emit` encodes the event once and writes the same payload to every
//! live destination; per-destination failures are logged and counted,
//! never propagated. The emitter is best-effort end to end: a partially
//! failed fan-out is normal operation.
//!
//! Destinations come from `lwes:<iface>:<ip>:<port>[:<ttl>]` strings or
//! are built directly. Multicast destinations get their egress
//! interface, TTL (default 3), and loopback disabled; every destination
//! gets a tuned send buffer (default 256MB, capped by the OS).
//!
//! # Example
//!
//! ```ignore
//! let config = EmitterConfig::parse(&["lwes::224.1.1.11:12345:16"])?;
//! let emitter = Emitter::open(config)?;
//!
//! let mut event = Event::new("MyApp::Startup");
//! event.set("version", "1.2.3");
//! emitter.emit(&event)?;
//!
//! emitter.close();
//! ```

mod config;
mod emitter;
mod metrics;

pub use config::{ConfigError, Destination, EmitterConfig, DEFAULT_SEND_BUFFER_SIZE, DEFAULT_TTL};
pub use emitter::{Emitter, EmitterError};
pub use metrics::{EmitterMetrics, EmitterMetricsHandle};

/// Result type for emitter operations
pub type Result<T> = std::result::Result<T, EmitterError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod config_test;
