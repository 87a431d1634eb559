//! LWES Protocol - wire codec for the Light Weight Event System
//!
//! This crate provides the types that cross the wire:
//! - `Value` - tagged sum over the LWES scalar types
//! - `Event` - a named, ordered bag of typed attributes
//! - encode/decode between `Event` and the on-wire byte layout
//!
//! # Wire Format
//!
//! One event per UDP datagram:
//! ```text
//! ┌─────────────┬────────────┬───────────────┬──────────────┐
//! │ 1 byte      │ N bytes    │ 2 bytes (BE)  │              │
//! │ name length │ name       │ attr count    │ attribute*   │
//! └─────────────┴────────────┴───────────────┴──────────────┘
//!
//! attribute := key_len(1) key_bytes type_tag(1) value
//! ```
//!
//! All multi-byte scalars are big-endian, except IPv4 addresses which
//! travel in reversed octet order (low octet first).
//!
//! # Design Principles
//!
//! - **Strict decode**: every read is bounds-checked; unknown tags and
//!   leftover bytes are hard errors with byte offsets for diagnostics
//! - **Exact pre-sizing**: `Event::encoded_size` agrees byte-for-byte
//!   with `Event::encode`, so the output buffer never reallocates
//! - **No shared state**: encoding never mutates, decoding always
//!   produces a fresh event

mod codec;
mod error;
mod event;
mod value;
mod wire;

pub use error::ProtocolError;
pub use event::Event;
pub use value::Value;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Largest payload a UDP datagram can carry: 65,535 minus 20 bytes of
/// IP header and 8 bytes of UDP header.
pub const MAX_DATAGRAM_SIZE: usize = 65_535 - 20 - 8;

/// Maximum event name length in bytes
pub const MAX_NAME_LEN: usize = 127;

/// Maximum attribute key length in bytes
pub const MAX_KEY_LEN: usize = 255;
