//! UDP receiver: socket setup, read loop, decoder worker pool
//!
//! # Lifecycle
//!
//! ```text
//! bind() ──> Initialized ──serve()──> Serving ──stop()──> Stopping ──> Drained
//! ```
//!
//! `serve` and `stop` are idempotent. `stop` cancels the read loop
//! (observed within one read timeout), waits for every in-flight buffer
//! to be released, then closes the buffer queue so decoder workers
//! drain and exit.
//!
//! # Read loop
//!
//! One dedicated task reads datagrams under a short deadline. Timeouts
//! and socket errors are counted and the loop continues. A filled
//! buffer is offered to the bounded queue with a non-blocking send:
//! accepted buffers are replaced from the pool, rejected ones are
//! counted as dropped and reused for the next read. Producers never
//! block on consumers.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossfire::{MAsyncRx, MAsyncTx, TrySendError};
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use lwes_protocol::{Event, MAX_DATAGRAM_SIZE};

use crate::metrics::{ReceiverMetrics, ReceiverMetricsHandle};
use crate::pool::{BufferPool, InFlightGate, PacketBuf};

// =============================================================================
// Constants
// =============================================================================

/// Default bound on queued packet buffers
const DEFAULT_QUEUE_SIZE: usize = 100_000;

/// Default per-packet buffer size (64KB covers any UDP payload)
const DEFAULT_MAX_PACKET_SIZE: usize = 64 * 1024;

/// Default kernel receive buffer (256MB, capped by the OS)
const DEFAULT_RECV_BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// Default read deadline; also bounds how long `stop` waits for the
/// read loop to notice cancellation
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

// =============================================================================
// Configuration
// =============================================================================

/// Receiver configuration
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Receiver identifier for logs and metrics
    pub id: String,

    /// Listen address in "host:port" form; a multicast address joins
    /// the group, anything else binds unicast
    pub address: String,

    /// Maximum queued packet buffers (and decoded events)
    pub queue_size: usize,

    /// Per-packet buffer size; floored at 65,507 so any valid UDP
    /// payload fits
    pub max_packet_size: usize,

    /// Requested SO_RCVBUF size (best effort)
    pub recv_buffer_size: usize,

    /// Socket read deadline
    pub read_timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            id: "lwes_udp".into(),
            address: "224.1.1.11:12345".into(),
            queue_size: DEFAULT_QUEUE_SIZE,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ReceiverConfig {
    /// Create config for the given listen address
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Packet buffer size after applying the UDP payload floor
    pub fn packet_capacity(&self) -> usize {
        self.max_packet_size.max(MAX_DATAGRAM_SIZE)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Receiver setup errors
///
/// Runtime read errors never surface here; they are counted in metrics
/// and the loop continues.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// Listen address did not resolve
    #[error("failed to resolve listen address {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Socket setup or bind failed
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

// =============================================================================
// Receiver
// =============================================================================

/// Multicast UDP receiver with a pooled read loop and bounded queues
pub struct Receiver {
    config: ReceiverConfig,
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    pool: Arc<BufferPool>,
    in_flight: Arc<InFlightGate>,
    metrics: Arc<ReceiverMetrics>,
    /// Send side of the buffer queue; dropped on stop to close the
    /// queue under the decoder workers
    buffer_tx: Mutex<Option<MAsyncTx<PacketBuf>>>,
    buffer_rx: MAsyncRx<PacketBuf>,
    serving: Arc<AtomicBool>,
    cancel: CancellationToken,
    read_task: Mutex<Option<JoinHandle<()>>>,
    decoder_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Receiver {
    /// Resolve the configured address, bind the socket (joining the
    /// multicast group when the address is one), and allocate queues
    pub async fn bind(config: ReceiverConfig) -> Result<Receiver, ReceiverError> {
        let addr = tokio::net::lookup_host(&config.address)
            .await
            .map_err(|e| ReceiverError::Resolve {
                address: config.address.clone(),
                source: e,
            })?
            .next()
            .ok_or_else(|| ReceiverError::Resolve {
                address: config.address.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            })?;

        let socket = bind_socket(addr, config.recv_buffer_size).map_err(|e| {
            ReceiverError::Bind {
                address: config.address.clone(),
                source: e,
            }
        })?;
        let local_addr = socket.local_addr().map_err(|e| ReceiverError::Bind {
            address: config.address.clone(),
            source: e,
        })?;

        tracing::info!(
            receiver = %config.id,
            address = %config.address,
            local = %local_addr,
            multicast = addr.ip().is_multicast(),
            queue_size = config.queue_size,
            "receiver listening"
        );

        let (buffer_tx, buffer_rx) = crossfire::mpmc::bounded_async(config.queue_size);
        let pool = Arc::new(BufferPool::new(config.packet_capacity()));

        Ok(Receiver {
            socket: Arc::new(socket),
            local_addr,
            pool,
            in_flight: Arc::new(InFlightGate::new()),
            metrics: Arc::new(ReceiverMetrics::new()),
            buffer_tx: Mutex::new(Some(buffer_tx)),
            buffer_rx,
            serving: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            read_task: Mutex::new(None),
            decoder_tasks: Mutex::new(Vec::new()),
            config,
        })
    }

    /// Start the read loop; returns immediately if already serving or
    /// already stopped
    pub fn serve(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.serving.swap(true, Ordering::SeqCst) {
            return;
        }
        let tx = match self.buffer_tx.lock().clone() {
            Some(tx) => tx,
            None => return,
        };

        let read_loop = ReadLoop {
            id: self.config.id.clone(),
            socket: Arc::clone(&self.socket),
            pool: Arc::clone(&self.pool),
            gate: Arc::clone(&self.in_flight),
            metrics: Arc::clone(&self.metrics),
            tx,
            serving: Arc::clone(&self.serving),
            cancel: self.cancel.clone(),
            read_timeout: self.config.read_timeout,
        };
        *self.read_task.lock() = Some(tokio::spawn(read_loop.run()));

        tracing::info!(receiver = %self.config.id, "receiver serving");
    }

    /// Whether the read loop is active
    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::SeqCst)
    }

    /// Stop serving and wait until drained
    ///
    /// Idempotent and safe to call from any task. Blocks until the read
    /// loop has exited, every in-flight buffer has been released, and
    /// the decoder workers (if any) have drained the closed queue.
    pub async fn stop(&self) {
        if !self.serving.swap(false, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();

        let read_task = self.read_task.lock().take();
        if let Some(task) = read_task {
            let _ = task.await;
        }

        // no buffer may be reclaimed while a consumer still reads it
        self.in_flight.wait_idle().await;

        // closing the queue releases the decoder workers
        self.buffer_tx.lock().take();
        let workers = std::mem::take(&mut *self.decoder_tasks.lock());
        for task in workers {
            let _ = task.await;
        }

        tracing::info!(receiver = %self.config.id, "receiver stopped");
    }

    /// The raw packet queue, for consumers that decode themselves
    ///
    /// The queue is multi-consumer; clones share the same stream.
    pub fn packets(&self) -> MAsyncRx<PacketBuf> {
        self.buffer_rx.clone()
    }

    /// Start `num_workers` decoder workers (0 means one per core) and
    /// return the decoded-event queue
    ///
    /// Workers drain the packet queue, count invalid packets, and offer
    /// each decoded event to a queue of the configured capacity with
    /// drop-newest semantics. Order is preserved per worker only.
    pub fn events(&self, num_workers: usize) -> MAsyncRx<Event> {
        let workers = if num_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            num_workers
        };

        let (event_tx, event_rx) = crossfire::mpmc::bounded_async(self.config.queue_size);

        let mut tasks = self.decoder_tasks.lock();
        for worker_id in 0..workers {
            let worker = DecodeWorker {
                id: worker_id,
                buffers: self.buffer_rx.clone(),
                events: event_tx.clone(),
                metrics: Arc::clone(&self.metrics),
            };
            tasks.push(tokio::spawn(worker.run()));
        }

        tracing::info!(
            receiver = %self.config.id,
            workers,
            "decoder workers started"
        );

        event_rx
    }

    /// Address the socket actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Buffers currently enqueued or held by consumers
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Metrics reference for direct inspection
    pub fn metrics(&self) -> &Arc<ReceiverMetrics> {
        &self.metrics
    }

    /// Get a metrics handle for the reporter
    pub fn metrics_handle(&self) -> ReceiverMetricsHandle {
        ReceiverMetricsHandle::new(self.config.id.clone(), Arc::clone(&self.metrics))
    }
}

/// Build the UDP socket: reuse flags, tuned receive buffer, multicast
/// join for group addresses
fn bind_socket(addr: SocketAddr, recv_buffer_size: usize) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // best effort; the OS caps this silently
    if let Err(e) = socket.set_recv_buffer_size(recv_buffer_size) {
        tracing::warn!(
            error = %e,
            requested_size = recv_buffer_size,
            "failed to set SO_RCVBUF"
        );
    }

    match addr.ip() {
        IpAddr::V4(group) if group.is_multicast() => {
            let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), addr.port());
            socket.bind(&bind_addr.into())?;
            socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        }
        IpAddr::V6(group) if group.is_multicast() => {
            let bind_addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), addr.port());
            socket.bind(&bind_addr.into())?;
            socket.join_multicast_v6(&group, 0)?;
        }
        _ => socket.bind(&addr.into())?,
    }

    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

// =============================================================================
// Read loop
// =============================================================================

/// The dedicated datagram read task
struct ReadLoop {
    id: String,
    socket: Arc<UdpSocket>,
    pool: Arc<BufferPool>,
    gate: Arc<InFlightGate>,
    metrics: Arc<ReceiverMetrics>,
    tx: MAsyncTx<PacketBuf>,
    serving: Arc<AtomicBool>,
    cancel: CancellationToken,
    read_timeout: Duration,
}

impl ReadLoop {
    async fn run(self) {
        tracing::debug!(receiver = %self.id, "read loop started");

        let mut storage = self.pool.acquire();

        loop {
            if !self.serving.load(Ordering::Relaxed) {
                break;
            }

            let read = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                read = timeout(self.read_timeout, self.socket.recv_from(&mut storage)) => read,
            };

            let n = match read {
                // deadline expired; check the serving flag and retry
                Err(_) => {
                    self.metrics.read_timeout();
                    continue;
                }
                Ok(Err(e)) => {
                    self.metrics.read_error();
                    tracing::debug!(receiver = %self.id, error = %e, "udp read error");
                    continue;
                }
                Ok(Ok((n, _peer))) => n,
            };

            self.metrics.packet_received(n as u64);

            // the in-flight slot is taken before the enqueue attempt
            let pbuf = PacketBuf::new(storage, n, Arc::clone(&self.pool), Arc::clone(&self.gate));
            match self.tx.try_send(pbuf) {
                Ok(()) => {
                    self.metrics.packet_processed(self.gate.count() as u64);
                    storage = self.pool.acquire();
                }
                Err(TrySendError::Full(pbuf)) => {
                    // drop-newest: count it and reuse the buffer
                    self.metrics.packet_dropped(n as u64);
                    storage = pbuf.into_storage();
                }
                Err(TrySendError::Disconnected(pbuf)) => {
                    storage = pbuf.into_storage();
                    break;
                }
            }
        }

        self.pool.release(storage);
        tracing::debug!(receiver = %self.id, "read loop stopped");
    }
}

// =============================================================================
// Decoder workers
// =============================================================================

/// One worker of the optional decode pool
struct DecodeWorker {
    id: usize,
    buffers: MAsyncRx<PacketBuf>,
    events: MAsyncTx<Event>,
    metrics: Arc<ReceiverMetrics>,
}

impl DecodeWorker {
    async fn run(mut self) {
        tracing::debug!(worker_id = self.id, "decoder worker started");

        while let Ok(pbuf) = self.buffers.recv().await {
            let decoded = Event::decode(pbuf.bytes());
            // recycle the buffer before touching the event queue
            drop(pbuf);

            match decoded {
                Err(e) => {
                    self.metrics.packet_invalid();
                    tracing::debug!(worker_id = self.id, error = %e, "invalid packet");
                }
                Ok(event) => {
                    self.metrics.packet_decoded();
                    match self.events.try_send(event) {
                        Ok(()) => self.metrics.packet_decoded_passed(),
                        Err(TrySendError::Full(_)) => self.metrics.packet_dropped_decoded(),
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
            }
        }

        tracing::debug!(worker_id = self.id, "decoder worker stopped");
    }
}
