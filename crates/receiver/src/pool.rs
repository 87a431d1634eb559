//! Buffer pool and in-flight accounting
//!
//! Datagram reads land in fixed-size buffers drawn from a pool and
//! returned when the consumer is done. The pool is an optimization, not
//! a correctness requirement: it may be empty at any time and falls
//! back to allocation.
//!
//! The [`InFlightGate`] counts buffers that have been offered to the
//! queue and not yet released; receiver shutdown waits on it so no
//! buffer is reclaimed while a consumer still reads it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Pool of fixed-size byte buffers shared across datagram reads
///
/// Safe for concurrent acquire/release from any number of tasks.
/// `acquire` never fails: an empty free list means a fresh allocation.
#[derive(Debug)]
pub struct BufferPool {
    buf_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create a pool handing out buffers of `buf_size` bytes
    pub fn new(buf_size: usize) -> Self {
        Self {
            buf_size,
            free: Mutex::new(Vec::new()),
        }
    }

    /// Size of every buffer this pool hands out
    #[inline]
    pub fn buf_size(&self) -> usize {
        self.buf_size
    }

    /// Number of released buffers currently waiting for reuse
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Take a buffer of `buf_size` bytes, reusing a released one when
    /// possible
    pub fn acquire(&self) -> Vec<u8> {
        match self.free.lock().pop() {
            Some(buf) => buf,
            None => vec![0u8; self.buf_size],
        }
    }

    /// Return a buffer for reuse
    pub fn release(&self, buf: Vec<u8>) {
        debug_assert_eq!(buf.len(), self.buf_size);
        self.free.lock().push(buf);
    }
}

/// Counts buffers handed to consumers and not yet released
///
/// The read loop increments before every enqueue attempt; the count
/// drops when the consumer drops the [`PacketBuf`] (or the drop-on-full
/// branch takes the buffer back). `wait_idle` parks until the count
/// reaches zero.
#[derive(Debug, Default)]
pub struct InFlightGate {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlightGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current in-flight count
    #[inline]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub(crate) fn add(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn done(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Wait until every outstanding buffer has been released
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// A filled datagram buffer owned by a consumer
///
/// Dropping it returns the storage to the pool and releases the
/// in-flight slot; there is nothing to call.
#[derive(Debug)]
pub struct PacketBuf {
    storage: Option<Vec<u8>>,
    len: usize,
    pool: Arc<BufferPool>,
    gate: Arc<InFlightGate>,
}

impl PacketBuf {
    /// Wrap a filled buffer, taking an in-flight slot
    pub(crate) fn new(
        storage: Vec<u8>,
        len: usize,
        pool: Arc<BufferPool>,
        gate: Arc<InFlightGate>,
    ) -> Self {
        gate.add();
        Self {
            storage: Some(storage),
            len,
            pool,
            gate,
        }
    }

    /// The received datagram payload
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        match &self.storage {
            Some(storage) => &storage[..self.len],
            None => &[],
        }
    }

    /// Number of bytes read into this buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Release the in-flight slot and take the storage back without
    /// returning it to the pool (the read loop reuses it directly when
    /// the queue is full)
    pub(crate) fn into_storage(mut self) -> Vec<u8> {
        self.gate.done();
        self.storage.take().unwrap_or_default()
    }
}

impl Drop for PacketBuf {
    fn drop(&mut self) {
        if let Some(storage) = self.storage.take() {
            self.pool.release(storage);
            self.gate.done();
        }
    }
}
