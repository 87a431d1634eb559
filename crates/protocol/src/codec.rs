//! Event encode/decode against the wire grammar
//!
//! ```text
//! event     := name_len(1) name_bytes attr_count(2,BE) attribute*
//! attribute := key_len(1) key_bytes type_tag(1) value
//! ```
//!
//! The attribute count is written by the encoder but treated as
//! informational by the decoder: relays append `ReceiptTime`,
//! `SenderIP` and `SenderPort` without touching the header, so the
//! decoder reads attributes until the buffer is exhausted.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::event::Event;
use crate::value::Value;
use crate::wire::{put_len_str, Cursor};
use crate::{MAX_KEY_LEN, MAX_NAME_LEN};

/// Attributes a relay commonly appends past the declared count
/// (ReceiptTime, SenderIP, SenderPort)
const AMBIENT_ATTRIBUTES: usize = 3;

/// Smallest byte sequence that can start an attribute: a key length,
/// one key byte, and a type tag
const MIN_ATTR_PREFIX: usize = 3;

impl Event {
    /// Exact number of bytes [`Event::encode`] will produce
    ///
    /// Divergence between this and the encoder output is a codec bug;
    /// the encoder debug-asserts the agreement.
    pub fn encoded_size(&self) -> usize {
        let mut size = 1 + self.name().len() + 2;
        for (key, value) in self.iter() {
            size += 1 + key.len() + value.wire_size();
        }
        size
    }

    /// Serialize to the wire layout
    ///
    /// Fails without side effects when the name or a key is out of its
    /// length range, an IP attribute is not IPv4, or a string exceeds
    /// the long-string maximum.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let name_len = self.name().len();
        if name_len == 0 || name_len > MAX_NAME_LEN {
            return Err(ProtocolError::NameTooLong(name_len));
        }

        let mut buf = BytesMut::with_capacity(self.encoded_size());
        put_len_str(&mut buf, self.name());
        buf.put_u16(self.len() as u16);

        for (key, value) in self.iter() {
            if key.is_empty() || key.len() > MAX_KEY_LEN {
                return Err(ProtocolError::KeyLengthOutOfRange(key.len()));
            }
            put_len_str(&mut buf, key);
            value.encode_into(&mut buf)?;
        }

        debug_assert_eq!(buf.len(), self.encoded_size());
        Ok(buf.freeze())
    }

    /// Parse an event from a datagram payload
    ///
    /// Pure function over the input bytes. The declared attribute count
    /// only pre-sizes the attribute vector (plus room for the three
    /// ambient fields); parsing continues to the end of the buffer and
    /// accepts attributes past the count.
    pub fn decode(data: &[u8]) -> Result<Event, ProtocolError> {
        let mut cur = Cursor::new(data);

        let name = cur.get_len_str()?;
        if name.is_empty() {
            return Err(ProtocolError::EmptyName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ProtocolError::NameTooLong(name.len()));
        }
        let name = String::from_utf8_lossy(name).into_owned();

        let declared = cur.get_u16()? as usize;
        let mut event = Event::with_capacity(name, declared + AMBIENT_ATTRIBUTES);

        while cur.remaining() >= MIN_ATTR_PREFIX {
            let key = cur.get_len_str()?;
            if key.is_empty() {
                return Err(ProtocolError::EmptyKey);
            }
            let key = String::from_utf8_lossy(key).into_owned();

            let tag_offset = cur.offset();
            let tag = cur.get_u8()?;
            let value = Value::decode(tag, tag_offset, &mut cur)?;

            event.push_attr(key, value);
        }

        // 1-2 leftover bytes cannot even name an attribute
        if !cur.is_empty() {
            return Err(ProtocolError::TrailingBytes {
                remaining: cur.remaining(),
            });
        }

        Ok(event)
    }
}
