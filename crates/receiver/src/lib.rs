//! LWES Receiver - multicast UDP ingestion for LWES events
//!
//! Binds a UDP endpoint (joining the group when the address is
//! multicast), reads datagrams into pooled buffers on a dedicated read
//! loop, and offers each filled buffer to a bounded queue. Consumers
//! either drain raw [`PacketBuf`]s or start a decoder worker pool that
//! turns them into typed [`lwes_protocol::Event`]s.
//!
//! # Design
//!
//! - **Drop-newest back-pressure**: both queues use non-blocking
//!   enqueue; the read loop never stalls behind a slow consumer
//! - **Buffer recycling**: buffers return to the pool when the consumer
//!   drops them; an in-flight gate blocks shutdown until every buffer
//!   handed out has come back
//! - **Never crash on a bad packet**: decode failures and socket errors
//!   are counted and the loop moves on
//!
//! # Example
//!
//! ```ignore
//! let config = ReceiverConfig {
//!     address: "224.1.1.11:12345".into(),
//!     ..Default::default()
//! };
//!
//! let receiver = Arc::new(Receiver::bind(config).await?);
//! let events = receiver.events(0); // decoder pool, one worker per core
//! receiver.serve();
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{event}");
//! }
//! ```

mod metrics;
mod pool;
mod receiver;

pub use metrics::{ReceiverMetrics, ReceiverMetricsHandle};
pub use pool::{BufferPool, InFlightGate, PacketBuf};
pub use receiver::{Receiver, ReceiverConfig, ReceiverError};

/// Result type for receiver operations
pub type Result<T> = std::result::Result<T, ReceiverError>;

#[cfg(test)]
mod receiver_test;
