use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Monotonically increasing identifier of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport the message was captured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Udp,
    Tcp,
    Sctp,
    Tls,
}

impl Transport {
    /// Stream transports may split or coalesce messages
    pub fn is_stream(&self) -> bool {
        matches!(self, Transport::Tcp | Transport::Tls)
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transport::Udp => "UDP",
            Transport::Tcp => "TCP",
            Transport::Sctp => "SCTP",
            Transport::Tls => "TLS",
        };
        f.write_str(name)
    }
}

/// Packet metadata supplied alongside the captured bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub id: FrameId,
    pub transport: Transport,
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub timestamp: DateTime<Utc>,
    /// The frame was already analysed in an earlier pass
    #[serde(default)]
    pub visited: bool,
    /// The message was found inside an error indication such as an ICMP payload
    #[serde(default)]
    pub in_error_packet: bool,
}

impl FrameInfo {
    pub fn new(
        id: u64,
        transport: Transport,
        source: SocketAddr,
        destination: SocketAddr,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FrameId(id),
            transport,
            source,
            destination,
            timestamp,
            visited: false,
            in_error_packet: false,
        }
    }

    /// Same frame, flagged as already visited
    pub fn revisited(&self) -> Self {
        Self {
            visited: true,
            ..self.clone()
        }
    }

    pub fn with_error_packet(mut self) -> Self {
        self.in_error_packet = true;
        self
    }
}

/// Identity of one SIP message inside a frame.
///
/// A TCP segment may carry several messages, each with its own memoised
/// correlation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageRef {
    pub frame: FrameId,
    pub index: u16,
}

impl MessageRef {
    pub fn new(frame: FrameId, index: u16) -> Self {
        Self { frame, index }
    }
}
