use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Source port stored in keys when resends may come from a different port
pub const CANONICAL_SOURCE_PORT: u16 = 0;

/// Identifies one direction of a transaction: Call-ID plus both endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionKey {
    pub call_id: String,
    pub source_address: IpAddr,
    pub source_port: u16,
    pub dest_address: IpAddr,
    pub dest_port: u16,
}

impl TransactionKey {
    /// Build a key, cutting the Call-ID to at most `max_call_id_len` bytes
    pub fn new(call_id: &str, source: SocketAddr, destination: SocketAddr, max_call_id_len: usize) -> Self {
        Self {
            call_id: truncate_call_id(call_id, max_call_id_len).to_string(),
            source_address: source.ip(),
            source_port: source.port(),
            dest_address: destination.ip(),
            dest_port: destination.port(),
        }
    }

    /// Fold the source port to [`CANONICAL_SOURCE_PORT`]
    pub fn with_canonical_source_port(mut self) -> Self {
        self.source_port = CANONICAL_SOURCE_PORT;
        self
    }

    /// The key of the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            call_id: self.call_id.clone(),
            source_address: self.dest_address,
            source_port: self.dest_port,
            dest_address: self.source_address,
            dest_port: self.source_port,
        }
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.call_id,
            SocketAddr::new(self.source_address, self.source_port),
            SocketAddr::new(self.dest_address, self.dest_port)
        )
    }
}

fn truncate_call_id(call_id: &str, max_len: usize) -> &str {
    if call_id.len() <= max_len {
        return call_id;
    }
    let mut end = max_len;
    while !call_id.is_char_boundary(end) {
        end -= 1;
    }
    &call_id[..end]
}
