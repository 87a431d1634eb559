//! Emitter destination configuration
//!
//! The textual form is `lwes:<iface>:<ip>:<port>[:<ttl>]`:
//!
//! - `iface` - IPv4 address of the egress interface for multicast, or
//!   empty for the OS default
//! - `ip`, `port` - the destination; port must be in [1, 65535]
//! - `ttl` - optional multicast TTL in [0, 255]
//!
//! Any deviation is a configuration error.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Default multicast TTL
pub const DEFAULT_TTL: u8 = 3;

/// Default kernel send buffer (256MB, capped by the OS)
pub const DEFAULT_SEND_BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// Destination string errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Not 4 or 5 colon-separated fields
    #[error("destination needs the form lwes:<iface>:<ip>:<port>[:<ttl>], got {0:?}")]
    InvalidFormat(String),

    /// First field was not `lwes`
    #[error("unsupported scheme {0:?}, only lwes is supported")]
    UnsupportedScheme(String),

    /// Interface field was not an IPv4 address
    #[error("invalid interface address {0:?}")]
    InvalidInterface(String),

    /// Destination field was not an IP address
    #[error("invalid destination address {0:?}")]
    InvalidAddress(String),

    /// Port missing, non-numeric, or zero
    #[error("invalid port {0:?}")]
    InvalidPort(String),

    /// TTL outside [0, 255]
    #[error("invalid ttl {0:?}")]
    InvalidTtl(String),
}

/// One UDP destination with its socket options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// IPv4 address of the multicast egress interface; `None` leaves
    /// the OS default
    pub interface: Option<Ipv4Addr>,

    /// Destination IP
    pub ip: IpAddr,

    /// Destination port
    pub port: u16,

    /// Requested SO_SNDBUF size; `None` means the 256MB default
    pub send_buffer: Option<usize>,

    /// Multicast TTL; `None` means the default of 3
    pub ttl: Option<u8>,
}

impl Destination {
    /// Create a destination with default options
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            interface: None,
            ip,
            port,
            send_buffer: None,
            ttl: None,
        }
    }

    /// The socket address to dial
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Whether this destination is a multicast group
    pub fn is_multicast(&self) -> bool {
        self.ip.is_multicast()
    }
}

impl FromStr for Destination {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        if !(4..=5).contains(&fields.len()) {
            return Err(ConfigError::InvalidFormat(s.to_owned()));
        }
        if fields[0] != "lwes" {
            return Err(ConfigError::UnsupportedScheme(fields[0].to_owned()));
        }

        let interface = if fields[1].is_empty() {
            None
        } else {
            Some(
                fields[1]
                    .parse::<Ipv4Addr>()
                    .map_err(|_| ConfigError::InvalidInterface(fields[1].to_owned()))?,
            )
        };

        let ip = fields[2]
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidAddress(fields[2].to_owned()))?;

        let port = fields[3]
            .parse::<u16>()
            .ok()
            .filter(|&p| p != 0)
            .ok_or_else(|| ConfigError::InvalidPort(fields[3].to_owned()))?;

        // ttl sits at zero-based field 4; an empty field means default
        let ttl = match fields.get(4) {
            None => None,
            Some(&"") => None,
            Some(raw) => Some(
                raw.parse::<u8>()
                    .map_err(|_| ConfigError::InvalidTtl((*raw).to_owned()))?,
            ),
        };

        Ok(Destination {
            interface,
            ip,
            port,
            send_buffer: None,
            ttl,
        })
    }
}

/// Emitter configuration: the destination list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitterConfig {
    pub destinations: Vec<Destination>,
}

impl EmitterConfig {
    /// Parse one destination string per entry
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, ConfigError> {
        let mut destinations = Vec::with_capacity(specs.len());
        for spec in specs {
            destinations.push(spec.as_ref().parse()?);
        }
        Ok(Self { destinations })
    }
}
