//! Codec error types
//!
//! Encoder errors are returned before any bytes are produced; decoder
//! errors leave the input untouched, so a receive buffer can always be
//! recycled after a failed decode.

/// Errors produced while encoding or decoding an event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Event name length outside [1, 127]
    #[error("event name length {0} outside [1, 127]")]
    NameTooLong(usize),

    /// Attribute key length outside [1, 255]
    #[error("attribute key length {0} outside [1, 255]")]
    KeyLengthOutOfRange(usize),

    /// IP address attribute was not a 4-byte IPv4 address
    #[error("IP address attribute must be IPv4")]
    InvalidIpAddr,

    /// String attribute too large for the long-string length field
    #[error("string attribute of {0} bytes exceeds the wire maximum")]
    StringTooLong(usize),

    /// Decoded event name had zero length
    #[error("event name is empty")]
    EmptyName,

    /// Decoded attribute key had zero length
    #[error("attribute key is empty")]
    EmptyKey,

    /// Input ended in the middle of a field
    #[error("unexpected end of event: {remaining} bytes remaining of {total}")]
    Truncated { remaining: usize, total: usize },

    /// Type tag not in the supported set (includes the reserved array
    /// tags 129-152 and the undefined tag 255)
    #[error("unknown type tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// Bytes left over after the last complete attribute
    #[error("{remaining} trailing bytes after last attribute")]
    TrailingBytes { remaining: usize },
}
