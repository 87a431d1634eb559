//! Wire primitives
//!
//! A position-tracking cursor for decoding, and small append helpers for
//! encoding. The cursor reports the absolute byte offset so decode errors
//! can point at the offending byte.

use bytes::{BufMut, BytesMut};

use crate::error::ProtocolError;

/// Append a one-byte length prefix followed by the string bytes.
///
/// The caller has already validated the length; lengths over 255 would
/// corrupt the frame, hence the debug assertion.
pub(crate) fn put_len_str(buf: &mut BytesMut, s: &str) {
    debug_assert!(s.len() <= u8::MAX as usize);
    buf.put_u8(s.len() as u8);
    buf.put_slice(s.as_bytes());
}

/// Bounds-checked reader over a byte slice.
///
/// Every read either consumes exactly the requested bytes or fails with
/// `Truncated` carrying the remaining/total counts, matching what the
/// receive pipeline logs for malformed packets.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Absolute offset of the next unread byte
    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    #[inline]
    fn truncated(&self) -> ProtocolError {
        ProtocolError::Truncated {
            remaining: self.remaining(),
            total: self.buf.len(),
        }
    }

    /// Consume exactly `n` bytes
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(self.truncated());
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn get_u8(&mut self) -> Result<u8, ProtocolError> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub(crate) fn get_u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn get_u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn get_u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a one-byte length prefix followed by that many bytes
    pub(crate) fn get_len_str(&mut self) -> Result<&'a [u8], ProtocolError> {
        let len = self.get_u8()? as usize;
        self.take(len)
    }
}
