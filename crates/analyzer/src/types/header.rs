use super::header_kind::HeaderKind;
use super::header_value::*;
use super::uri::UriOffsets;
use crate::error::Warning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Resolved name of a header line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderName {
    /// A registered header, reached through its full or compact name
    Known(HeaderKind),
    /// A name listed in the configured custom headers (lowercased)
    Custom(String),
    /// Any other extension header (lowercased)
    Unknown(String),
}

impl HeaderName {
    pub fn kind(&self) -> Option<HeaderKind> {
        match self {
            HeaderName::Known(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::Known(kind) => kind.as_str(),
            HeaderName::Custom(name) | HeaderName::Unknown(name) => name,
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of a header value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderValue {
    /// Kept as raw text, see `HeaderField::value_span`
    Opaque,
    Integer(u32),
    CallId(String),
    CSeq(CSeqValue),
    RAck(RAckValue),
    Address(AddressValue),
    Contact(ContactList),
    UriList(Vec<UriOffsets>),
    Via(Vec<ViaEntry>),
    Auth(AuthValue),
    ContentType(ContentTypeValue),
    Reason(ReasonValue),
    SecurityMechanisms(Vec<SecurityMechanism>),
    SessionId(SessionIdValue),
    AccessNetworkInfo(AccessNetworkInfo),
}

/// One logical header line of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderField {
    pub name: HeaderName,
    /// Whole logical line, folded continuation lines included, without the line terminator
    pub line_span: Range<usize>,
    pub name_span: Range<usize>,
    /// Value after the colon and any leading whitespace
    pub value_span: Range<usize>,
    pub value: HeaderValue,
    pub warnings: Vec<Warning>,
}

impl HeaderField {
    pub fn kind(&self) -> Option<HeaderKind> {
        self.name.kind()
    }

    /// Raw value text. Folded lines keep their embedded line breaks.
    pub fn raw_value<'a>(&self, msg: &'a [u8]) -> &'a [u8] {
        msg.get(self.value_span.clone()).unwrap_or_default()
    }
}
