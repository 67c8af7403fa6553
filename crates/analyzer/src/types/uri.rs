use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Byte ranges of one `name-addr` / `addr-spec` occurrence.
///
/// All ranges are half-open offsets into the message buffer. A field that
/// is absent in the input is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriOffsets {
    /// Whole name-addr, including display name and angle brackets
    pub name_addr: Option<Range<usize>>,
    /// Display name without surrounding quotes
    pub display_name: Option<Range<usize>>,
    /// The URI itself, scheme through parameters
    pub uri: Option<Range<usize>>,
    pub user: Option<Range<usize>>,
    /// Host without IPv6 brackets
    pub host: Option<Range<usize>>,
    pub port: Option<Range<usize>>,
    /// URI parameters after the first `;`
    pub parameters: Option<Range<usize>>,
}

impl UriOffsets {
    /// Slice one of the ranges out of the message
    pub fn text<'a>(msg: &'a [u8], range: &Option<Range<usize>>) -> Option<&'a str> {
        range
            .as_ref()
            .and_then(|r| msg.get(r.clone()))
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Numeric port, when present and valid
    pub fn port_number(&self, msg: &[u8]) -> Option<u16> {
        Self::text(msg, &self.port).and_then(|p| p.parse().ok())
    }

    /// Ranges are well formed and nested inside the name-addr span
    pub fn is_consistent(&self) -> bool {
        let outer = match &self.name_addr {
            Some(r) => r,
            None => return false,
        };
        [
            &self.display_name,
            &self.uri,
            &self.user,
            &self.host,
            &self.port,
            &self.parameters,
        ]
        .iter()
        .filter_map(|r| r.as_ref())
        .all(|r| r.start <= r.end && r.start >= outer.start && r.end <= outer.end)
    }
}
