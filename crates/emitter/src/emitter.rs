//! The emitter: per-destination sockets and encode-once fan-out
//!
//! Opening dials every configured destination independently; failures
//! are logged and the destination skipped, and the emitter comes up as
//! long as one destination survives. `emit` takes shared access to the
//! destination list, `close` exclusive access; emitting after close is
//! a silent no-op.

use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;

use parking_lot::RwLock;
use socket2::{Domain, Protocol, Socket, Type};

use lwes_protocol::Event;

use crate::config::{Destination, EmitterConfig, DEFAULT_SEND_BUFFER_SIZE, DEFAULT_TTL};
use crate::metrics::{EmitterMetrics, EmitterMetricsHandle};

/// Emitter errors
///
/// Per-destination write failures are logged and counted, never
/// returned; only a config mistake or an unencodable event surfaces.
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    /// Every configured destination failed to open
    #[error("no destinations could be opened")]
    NoDestinations,

    /// The event could not be encoded
    #[error(transparent)]
    Encode(#[from] lwes_protocol::ProtocolError),
}

/// One dialed destination
struct Conn {
    socket: UdpSocket,
    addr: SocketAddr,
}

/// Multi-destination UDP emitter
///
/// `emit` may be called from any thread; `close` synchronizes with
/// in-progress emits through the destination lock.
pub struct Emitter {
    conns: RwLock<Vec<Conn>>,
    metrics: Arc<EmitterMetrics>,
}

impl Emitter {
    /// Dial every destination, skipping ones that fail
    ///
    /// Returns `NoDestinations` only when nothing could be opened.
    pub fn open(config: EmitterConfig) -> Result<Emitter, EmitterError> {
        let mut conns = Vec::with_capacity(config.destinations.len());

        for dest in &config.destinations {
            match open_destination(dest) {
                Ok(conn) => {
                    tracing::info!(destination = %conn.addr, "emitter destination open");
                    conns.push(conn);
                }
                Err(e) => {
                    tracing::warn!(
                        destination = %dest.addr(),
                        error = %e,
                        "failed to open destination, skipping"
                    );
                }
            }
        }

        if conns.is_empty() {
            return Err(EmitterError::NoDestinations);
        }

        let metrics = Arc::new(EmitterMetrics::new());
        metrics.set_destinations(conns.len() as u64);

        Ok(Emitter {
            conns: RwLock::new(conns),
            metrics,
        })
    }

    /// Encode once and write the payload to every live destination
    ///
    /// Write failures are logged per destination and do not abort the
    /// fan-out. After `close` this is a no-op, not an error.
    pub fn emit(&self, event: &Event) -> Result<(), EmitterError> {
        let conns = self.conns.read();
        if conns.is_empty() {
            return Ok(());
        }

        let payload = event.encode()?;
        self.metrics.event_emitted();

        for conn in conns.iter() {
            match conn.socket.send(&payload) {
                Ok(n) => self.metrics.bytes_written(n as u64),
                Err(e) => {
                    self.metrics.write_error();
                    tracing::warn!(
                        destination = %conn.addr,
                        error = %e,
                        "failed to write event"
                    );
                }
            }
        }

        Ok(())
    }

    /// Close every destination; further `emit` calls succeed trivially
    pub fn close(&self) {
        let mut conns = self.conns.write();
        conns.clear();
        self.metrics.set_destinations(0);
        tracing::info!("emitter closed");
    }

    /// Destinations currently open
    pub fn destination_count(&self) -> usize {
        self.conns.read().len()
    }

    /// Metrics reference for direct inspection
    pub fn metrics(&self) -> &Arc<EmitterMetrics> {
        &self.metrics
    }

    /// Get a metrics handle for the reporter
    pub fn metrics_handle(&self, id: impl Into<String>) -> EmitterMetricsHandle {
        EmitterMetricsHandle::new(id.into(), Arc::clone(&self.metrics))
    }
}

/// Build and connect the socket for one destination
fn open_destination(dest: &Destination) -> io::Result<Conn> {
    let addr = dest.addr();
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    // best effort; the OS caps this silently
    let send_buffer = dest.send_buffer.unwrap_or(DEFAULT_SEND_BUFFER_SIZE);
    if let Err(e) = socket.set_send_buffer_size(send_buffer) {
        tracing::debug!(
            destination = %addr,
            requested_size = send_buffer,
            error = %e,
            "failed to set SO_SNDBUF"
        );
    }

    if dest.is_multicast() {
        match dest.ip {
            IpAddr::V4(_) => {
                if let Some(interface) = dest.interface {
                    socket.set_multicast_if_v4(&interface)?;
                }
                socket.set_multicast_ttl_v4(u32::from(dest.ttl.unwrap_or(DEFAULT_TTL)))?;
                socket.set_multicast_loop_v4(false)?;
            }
            IpAddr::V6(_) => {
                socket.set_multicast_hops_v6(u32::from(dest.ttl.unwrap_or(DEFAULT_TTL)))?;
                socket.set_multicast_loop_v6(false)?;
            }
        }
    }

    socket.connect(&addr.into())?;

    Ok(Conn {
        socket: socket.into(),
        addr,
    })
}
