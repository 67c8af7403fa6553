//! Header name resolution
//!
//! Every registered SIP header is a [`HeaderKind`] variant. Names are resolved
//! in two tiers, in this order of precedence:
//!
//! 1. the lowercased full name is looked up in a table built once on first
//!    use (names of length 1 skip this tier);
//! 2. the name is compared against the single-character compact aliases.
//!
//! A name that matches neither tier is not an error. The caller keeps it as
//! an opaque extension header.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

macro_rules! header_kinds {
    (@compact) => { None };
    (@compact $c:literal) => { Some($c) };
    ($( $variant:ident => $name:literal $(| $compact:literal)? ),* $(,)?) => {
        /// Canonical kind of a registered SIP header
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum HeaderKind {
            $( $variant, )*
        }

        impl HeaderKind {
            /// Every registered header
            pub const ALL: &'static [HeaderKind] = &[ $( HeaderKind::$variant, )* ];

            /// Canonical capitalisation of the full header name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( HeaderKind::$variant => $name, )*
                }
            }

            /// Single-character compact alias, if the header has one
            pub fn compact_form(&self) -> Option<char> {
                match self {
                    $( HeaderKind::$variant => header_kinds!(@compact $($compact)?), )*
                }
            }
        }
    };
}

header_kinds! {
    Accept => "Accept",
    AcceptContact => "Accept-Contact" | 'a',
    AcceptEncoding => "Accept-Encoding",
    AcceptLanguage => "Accept-Language",
    AcceptResourcePriority => "Accept-Resource-Priority",
    AlertInfo => "Alert-Info",
    Allow => "Allow",
    AllowEvents => "Allow-Events" | 'u',
    AnswerMode => "Answer-Mode",
    AuthenticationInfo => "Authentication-Info",
    Authorization => "Authorization",
    CallId => "Call-ID" | 'i',
    CallInfo => "Call-Info",
    Contact => "Contact" | 'm',
    ContentDisposition => "Content-Disposition",
    ContentEncoding => "Content-Encoding" | 'e',
    ContentLanguage => "Content-Language",
    ContentLength => "Content-Length" | 'l',
    ContentType => "Content-Type" | 'c',
    CSeq => "CSeq",
    Date => "Date",
    ErrorInfo => "Error-Info",
    Event => "Event" | 'o',
    Expires => "Expires",
    FeatureCaps => "Feature-Caps",
    FlowTimer => "Flow-Timer",
    From => "From" | 'f',
    Geolocation => "Geolocation",
    GeolocationError => "Geolocation-Error",
    GeolocationRouting => "Geolocation-Routing",
    HistoryInfo => "History-Info",
    Identity => "Identity" | 'y',
    IdentityInfo => "Identity-Info" | 'n',
    InfoPackage => "Info-Package",
    InReplyTo => "In-Reply-To",
    Join => "Join",
    MaxBreadth => "Max-Breadth",
    MaxForwards => "Max-Forwards",
    MimeVersion => "MIME-Version",
    MinExpires => "Min-Expires",
    MinSe => "Min-SE",
    Organization => "Organization",
    PAccessNetworkInfo => "P-Access-Network-Info",
    PAnswerState => "P-Answer-State",
    PAssertedIdentity => "P-Asserted-Identity",
    PAssertedService => "P-Asserted-Service",
    PAssociatedUri => "P-Associated-URI",
    PCalledPartyId => "P-Called-Party-ID",
    PChargingFunctionAddresses => "P-Charging-Function-Addresses",
    PChargingVector => "P-Charging-Vector",
    PDcsTracePartyId => "P-DCS-Trace-Party-ID",
    PDcsOsps => "P-DCS-OSPS",
    PDcsBillingInfo => "P-DCS-Billing-Info",
    PDcsLaes => "P-DCS-LAES",
    PDcsRedirect => "P-DCS-Redirect",
    PEarlyMedia => "P-Early-Media",
    PMediaAuthorization => "P-Media-Authorization",
    PPreferredIdentity => "P-Preferred-Identity",
    PPreferredService => "P-Preferred-Service",
    PProfileKey => "P-Profile-Key",
    PRefusedUriList => "P-Refused-URI-List",
    PServedUser => "P-Served-User",
    PUserDatabase => "P-User-Database",
    PVisitedNetworkId => "P-Visited-Network-ID",
    Path => "Path",
    PermissionMissing => "Permission-Missing",
    PolicyContact => "Policy-Contact",
    PolicyId => "Policy-ID",
    Priority => "Priority",
    PrivAnswerMode => "Priv-Answer-Mode",
    Privacy => "Privacy",
    ProxyAuthenticate => "Proxy-Authenticate",
    ProxyAuthorization => "Proxy-Authorization",
    ProxyRequire => "Proxy-Require",
    RAck => "RAck",
    Reason => "Reason",
    ReasonPhrase => "Reason-Phrase",
    RecordRoute => "Record-Route",
    RecvInfo => "Recv-Info",
    ReferSub => "Refer-Sub",
    ReferTo => "Refer-To" | 'r',
    ReferredBy => "Referred-By" | 'b',
    RejectContact => "Reject-Contact" | 'j',
    Replaces => "Replaces",
    ReplyTo => "Reply-To",
    RequestDisposition => "Request-Disposition" | 'd',
    Require => "Require",
    ResourcePriority => "Resource-Priority",
    RetryAfter => "Retry-After",
    Route => "Route",
    RSeq => "RSeq",
    SecurityClient => "Security-Client",
    SecurityServer => "Security-Server",
    SecurityVerify => "Security-Verify",
    Server => "Server",
    ServiceRoute => "Service-Route",
    SessionExpires => "Session-Expires" | 'x',
    SessionId => "Session-ID",
    SipETag => "SIP-ETag",
    SipIfMatch => "SIP-If-Match",
    Subject => "Subject" | 's',
    SubscriptionState => "Subscription-State",
    Supported => "Supported" | 'k',
    SuppressIfMatch => "Suppress-If-Match",
    TargetDialog => "Target-Dialog",
    Timestamp => "Timestamp",
    To => "To" | 't',
    TriggerConsent => "Trigger-Consent",
    Unsupported => "Unsupported",
    UserAgent => "User-Agent",
    Via => "Via" | 'v',
    Warning => "Warning",
    WwwAuthenticate => "WWW-Authenticate",
    Diversion => "Diversion",
    UserToUser => "User-to-User",
}

fn full_name_table() -> &'static HashMap<String, HeaderKind> {
    static TABLE: OnceLock<HashMap<String, HeaderKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HeaderKind::ALL
            .iter()
            .map(|kind| (kind.as_str().to_ascii_lowercase(), *kind))
            .collect()
    })
}

impl HeaderKind {
    /// Exact lookup of a lowercased full header name
    pub fn lookup_full(name: &str) -> Option<HeaderKind> {
        full_name_table().get(name).copied()
    }

    /// Linear scan of the compact aliases
    pub fn lookup_compact(name: &str) -> Option<HeaderKind> {
        let mut chars = name.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        HeaderKind::ALL
            .iter()
            .find(|kind| {
                kind.compact_form()
                    .map_or(false, |alias| alias.eq_ignore_ascii_case(&c))
            })
            .copied()
    }

    /// Resolve a header name (any case) to its kind
    pub fn resolve(name: &str) -> Option<HeaderKind> {
        let lowered = name.to_ascii_lowercase();
        if lowered.len() > 1 {
            if let Some(kind) = Self::lookup_full(&lowered) {
                return Some(kind);
            }
        }
        Self::lookup_compact(&lowered)
    }

    /// Whether the value is a comma separated list of name-addr / addr-spec
    pub fn is_route_list(&self) -> bool {
        matches!(
            self,
            HeaderKind::Route | HeaderKind::RecordRoute | HeaderKind::ServiceRoute | HeaderKind::Path
        )
    }

    /// Whether the value follows the authentication challenge/credentials grammar
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            HeaderKind::Authorization
                | HeaderKind::ProxyAuthorization
                | HeaderKind::WwwAuthenticate
                | HeaderKind::ProxyAuthenticate
                | HeaderKind::AuthenticationInfo
        )
    }

    /// Whether the value is a security mechanism list
    pub fn is_security_mechanism(&self) -> bool {
        matches!(
            self,
            HeaderKind::SecurityClient | HeaderKind::SecurityServer | HeaderKind::SecurityVerify
        )
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_names_resolve_case_insensitively() {
        assert_eq!(HeaderKind::resolve("Via"), Some(HeaderKind::Via));
        assert_eq!(HeaderKind::resolve("CALL-ID"), Some(HeaderKind::CallId));
        assert_eq!(HeaderKind::resolve("cseq"), Some(HeaderKind::CSeq));
        assert_eq!(
            HeaderKind::resolve("p-access-network-info"),
            Some(HeaderKind::PAccessNetworkInfo)
        );
        assert_eq!(HeaderKind::resolve("user-to-user"), Some(HeaderKind::UserToUser));
    }

    #[test]
    fn test_compact_names() {
        let expected = [
            ("f", HeaderKind::From),
            ("t", HeaderKind::To),
            ("m", HeaderKind::Contact),
            ("v", HeaderKind::Via),
            ("i", HeaderKind::CallId),
            ("l", HeaderKind::ContentLength),
            ("c", HeaderKind::ContentType),
            ("k", HeaderKind::Supported),
            ("s", HeaderKind::Subject),
            ("e", HeaderKind::ContentEncoding),
            ("o", HeaderKind::Event),
            ("r", HeaderKind::ReferTo),
            ("b", HeaderKind::ReferredBy),
            ("j", HeaderKind::RejectContact),
            ("d", HeaderKind::RequestDisposition),
            ("x", HeaderKind::SessionExpires),
            ("y", HeaderKind::Identity),
            ("n", HeaderKind::IdentityInfo),
            ("u", HeaderKind::AllowEvents),
            ("a", HeaderKind::AcceptContact),
        ];
        for (alias, kind) in expected {
            assert_eq!(HeaderKind::resolve(alias), Some(kind), "alias {}", alias);
            assert_eq!(HeaderKind::resolve(&alias.to_uppercase()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(HeaderKind::resolve("X-Custom"), None);
        assert_eq!(HeaderKind::resolve("z"), None);
        assert_eq!(HeaderKind::resolve(""), None);
    }

    #[test]
    fn test_compact_scan_only_for_single_characters() {
        assert_eq!(HeaderKind::lookup_compact("vv"), None);
        assert_eq!(HeaderKind::lookup_full("v"), None);
    }

    #[test]
    fn test_table_has_unique_names() {
        let table = full_name_table();
        assert_eq!(table.len(), HeaderKind::ALL.len());
    }
}
