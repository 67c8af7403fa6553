//! Structured header values
//!
//! Every value keeps the byte ranges it was read from, so callers can map a
//! parsed field back to the captured bytes. Numbers are decoded eagerly.

use super::method::Method;
use super::uri::UriOffsets;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// `CSeq: 4711 INVITE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CSeqValue {
    pub number: u32,
    pub number_span: Range<usize>,
    pub method: Method,
    pub method_span: Range<usize>,
}

/// `RAck: 776656 1 INVITE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RAckValue {
    pub response_num: u32,
    pub cseq_num: u32,
    pub method: Method,
}

/// To, From and identity headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValue {
    pub uri: UriOffsets,
    /// Value of the `tag` parameter
    pub tag: Option<Range<usize>>,
}

/// One contact-param of a Contact header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub uri: UriOffsets,
    /// Each `;`-separated contact parameter
    pub params: Vec<Range<usize>>,
    /// Decoded `expires` parameter
    pub expires: Option<u32>,
}

/// Contact header value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    /// `Contact: *`
    pub star: bool,
    pub contacts: Vec<ContactEntry>,
}

impl ContactList {
    /// Contacts asking for removal of their binding
    pub fn expires_zero(&self) -> usize {
        self.contacts.iter().filter(|c| c.expires == Some(0)).count()
    }

    /// Contacts without an `expires` parameter
    pub fn expires_unknown(&self) -> usize {
        self.contacts.iter().filter(|c| c.expires.is_none()).count()
    }
}

/// Recognised Via parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViaParamName {
    Branch,
    Maddr,
    Rport,
    Received,
    Ttl,
    Comp,
    SigcompId,
}

impl ViaParamName {
    pub fn from_name(name: &str) -> Option<Self> {
        let param = match name.to_ascii_lowercase().as_str() {
            "branch" => ViaParamName::Branch,
            "maddr" => ViaParamName::Maddr,
            "rport" => ViaParamName::Rport,
            "received" => ViaParamName::Received,
            "ttl" => ViaParamName::Ttl,
            "comp" => ViaParamName::Comp,
            "sigcomp-id" => ViaParamName::SigcompId,
            _ => return None,
        };
        Some(param)
    }
}

/// A `;name[=value]` Via parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaParam {
    /// `None` for parameters kept as opaque text
    pub name: Option<ViaParamName>,
    /// From the character after `;` to the end of the value
    pub span: Range<usize>,
    pub value: Option<Range<usize>>,
}

/// One via-parm of a Via header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaEntry {
    /// Transport tokens after `SIP/2.0/`
    pub transports: Vec<Range<usize>>,
    /// Sent-by host without IPv6 brackets
    pub sent_by: Option<Range<usize>>,
    pub sent_by_port: Option<u16>,
    pub params: Vec<ViaParam>,
}

impl ViaEntry {
    pub fn param(&self, name: ViaParamName) -> Option<&ViaParam> {
        self.params.iter().find(|p| p.name == Some(name))
    }
}

/// Recognised authentication parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthParamName {
    Response,
    Nc,
    Username,
    Realm,
    Nonce,
    Algorithm,
    Opaque,
    Qop,
    Cnonce,
    Uri,
    Domain,
    Stale,
    Auts,
    Rspauth,
    Nextnonce,
    Ik,
    Ck,
}

impl AuthParamName {
    const TABLE: [(&'static str, AuthParamName); 17] = [
        ("response", AuthParamName::Response),
        ("nc", AuthParamName::Nc),
        ("username", AuthParamName::Username),
        ("realm", AuthParamName::Realm),
        ("nonce", AuthParamName::Nonce),
        ("algorithm", AuthParamName::Algorithm),
        ("opaque", AuthParamName::Opaque),
        ("qop", AuthParamName::Qop),
        ("cnonce", AuthParamName::Cnonce),
        ("uri", AuthParamName::Uri),
        ("domain", AuthParamName::Domain),
        ("stale", AuthParamName::Stale),
        ("auts", AuthParamName::Auts),
        ("rspauth", AuthParamName::Rspauth),
        ("nextnonce", AuthParamName::Nextnonce),
        ("ik", AuthParamName::Ik),
        ("ck", AuthParamName::Ck),
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, p)| *p)
    }
}

/// A `name=value` authentication parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParam {
    /// `None` for parameters kept as opaque text
    pub name: Option<AuthParamName>,
    pub name_span: Range<usize>,
    /// Raw value, quotes included
    pub value_span: Range<usize>,
}

/// Authorization, WWW-Authenticate, Proxy-* and Authentication-Info values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthValue {
    /// Absent for Authentication-Info
    pub scheme: Option<Range<usize>>,
    pub params: Vec<AuthParam>,
}

impl AuthValue {
    pub fn param(&self, name: AuthParamName) -> Option<&AuthParam> {
        self.params.iter().find(|p| p.name == Some(name))
    }
}

/// Content-Type value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeValue {
    /// Lowercased `type/subtype`
    pub media_type: String,
    pub parameters: Option<Range<usize>>,
}

/// Reason header value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonValue {
    pub protocol: Range<usize>,
    /// Cause code, only decoded for `Q.850`
    pub cause: Option<u32>,
}

/// Recognised security mechanism parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityParamName {
    Alg,
    Ealg,
    Prot,
    SpiC,
    SpiS,
    Port1,
    PortC,
    Port2,
    PortS,
}

impl SecurityParamName {
    pub fn from_name(name: &str) -> Option<Self> {
        let param = match name.to_ascii_lowercase().as_str() {
            "alg" => SecurityParamName::Alg,
            "ealg" => SecurityParamName::Ealg,
            "prot" => SecurityParamName::Prot,
            "spi-c" => SecurityParamName::SpiC,
            "spi-s" => SecurityParamName::SpiS,
            "port1" => SecurityParamName::Port1,
            "port-c" => SecurityParamName::PortC,
            "port2" => SecurityParamName::Port2,
            "port-s" => SecurityParamName::PortS,
            _ => return None,
        };
        Some(param)
    }

    /// Parameters whose value must be a decimal number
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            SecurityParamName::Alg | SecurityParamName::Ealg | SecurityParamName::Prot
        )
    }
}

/// One `;name[=value]` security mechanism parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityParam {
    pub name: Option<SecurityParamName>,
    pub span: Range<usize>,
    pub value: Option<Range<usize>>,
    /// Decoded value for numeric parameters
    pub number: Option<u32>,
}

/// One sec-mechanism of a Security-Client/Server/Verify header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityMechanism {
    pub mechanism: Range<usize>,
    pub params: Vec<SecurityParam>,
}

impl SecurityMechanism {
    pub fn param(&self, name: SecurityParamName) -> Option<&SecurityParam> {
        self.params.iter().find(|p| p.name == Some(name))
    }
}

/// Session-ID header value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdValue {
    pub local: Range<usize>,
    /// Local and remote identifiers, both present only when both are 32 hex digits
    pub local_uuid: Option<u128>,
    pub remote_uuid: Option<u128>,
    /// Parameters not decoded as `remote`
    pub params: Vec<Range<usize>>,
}

/// P-Access-Network-Info value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessNetworkInfo {
    pub access_type: Range<usize>,
    pub utran_cell_id: Option<Range<usize>>,
    pub params: Vec<Range<usize>>,
}

/// Render a 128-bit identifier in GUID notation
pub fn format_guid(id: u128) -> String {
    let hex = format!("{:032x}", id);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_tables_are_case_insensitive() {
        assert_eq!(AuthParamName::from_name("NONCE"), Some(AuthParamName::Nonce));
        assert_eq!(AuthParamName::from_name("x-foo"), None);
        assert_eq!(ViaParamName::from_name("Branch"), Some(ViaParamName::Branch));
        assert_eq!(ViaParamName::from_name("sigcomp-id"), Some(ViaParamName::SigcompId));
        assert_eq!(SecurityParamName::from_name("SPI-C"), Some(SecurityParamName::SpiC));
        assert!(SecurityParamName::SpiC.is_numeric());
        assert!(!SecurityParamName::Ealg.is_numeric());
    }

    #[test]
    fn test_format_guid() {
        let id = 0xab30317f1a784d1c9fa6c1b2e4d5f678u128;
        assert_eq!(format_guid(id), "ab30317f-1a78-4d1c-9fa6-c1b2e4d5f678");
    }
}
