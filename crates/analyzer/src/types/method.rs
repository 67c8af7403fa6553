use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SIP request methods recognised by the analyzer.
///
/// Method names are case-sensitive in SIP, so `invite` is an extension
/// method and not [`Method::Invite`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Ack,
    Bye,
    Cancel,
    Do,
    Info,
    Invite,
    Message,
    Notify,
    Options,
    Prack,
    Qauth,
    Refer,
    Register,
    Sprack,
    Subscribe,
    Update,
    Publish,
    /// Any other token
    Extension(String),
}

impl Method {
    /// All known methods, in the order they are listed in statistics output
    pub const KNOWN: [Method; 17] = [
        Method::Ack,
        Method::Bye,
        Method::Cancel,
        Method::Do,
        Method::Info,
        Method::Invite,
        Method::Message,
        Method::Notify,
        Method::Options,
        Method::Prack,
        Method::Qauth,
        Method::Refer,
        Method::Register,
        Method::Sprack,
        Method::Subscribe,
        Method::Update,
        Method::Publish,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Do => "DO",
            Method::Info => "INFO",
            Method::Invite => "INVITE",
            Method::Message => "MESSAGE",
            Method::Notify => "NOTIFY",
            Method::Options => "OPTIONS",
            Method::Prack => "PRACK",
            Method::Qauth => "QAUTH",
            Method::Refer => "REFER",
            Method::Register => "REGISTER",
            Method::Sprack => "SPRACK",
            Method::Subscribe => "SUBSCRIBE",
            Method::Update => "UPDATE",
            Method::Publish => "PUBLISH",
            Method::Extension(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Method::Extension(_))
    }

    /// Build a method from raw bytes of a request line or CSeq header
    pub fn from_bytes(raw: &[u8]) -> Method {
        let text = String::from_utf8_lossy(raw);
        match Method::from_str(&text) {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = Method::KNOWN
            .iter()
            .find(|m| m.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Method::Extension(s.to_string()));
        Ok(method)
    }
}
