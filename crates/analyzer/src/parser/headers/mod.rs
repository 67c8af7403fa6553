//! Header field parsing
//!
//! A logical header line is split at its first colon, the name is resolved
//! to a [`HeaderKind`] and the value is handed to the parser for that kind.
//! Value parsers work on absolute offsets into the message buffer and never
//! look past the end of the line they were given.

pub mod access_network_info;
pub mod address;
pub mod auth;
pub mod contact;
pub mod content_type;
pub mod cseq;
pub mod numeric;
pub mod reason;
pub mod route;
pub mod security;
pub mod session_id;
pub mod via;

use crate::config::AnalyzerConfig;
use crate::error::{Warning, WarningKind};
use crate::parser::utils::{find_byte, skip_wsp, text, trim_wsp_end};
use crate::types::{HeaderField, HeaderKind, HeaderName, HeaderValue};
use std::ops::Range;
use tracing::trace;

pub use access_network_info::parse_access_network_info;
pub use address::parse_address;
pub use auth::parse_auth;
pub use contact::parse_contact;
pub use content_type::parse_content_type;
pub use cseq::{parse_cseq, parse_rack};
pub use numeric::parse_integer;
pub use reason::parse_reason;
pub use route::parse_uri_list;
pub use security::parse_security_mechanisms;
pub use session_id::parse_session_id;
pub use via::parse_via;

/// Parse one logical header line.
///
/// Returns `None` when the line has no colon; the caller records the
/// warning against the message.
pub fn parse_header_line(buf: &[u8], line: Range<usize>, config: &AnalyzerConfig) -> Option<HeaderField> {
    let colon = find_byte(buf, line.start, line.end, b':')?;
    let name_span = line.start..trim_wsp_end(buf, line.start, colon);
    let value_start = skip_wsp(buf, colon + 1, line.end);
    let value_span = value_start..trim_wsp_end(buf, value_start, line.end);

    let raw_name = text(buf, name_span.clone());
    let mut warnings = Vec::new();
    let name = match HeaderKind::resolve(&raw_name) {
        Some(kind) => HeaderName::Known(kind),
        None if config.is_custom_header(&raw_name) => HeaderName::Custom(raw_name.to_ascii_lowercase()),
        None => {
            warnings.push(Warning::new(WarningKind::UnrecognizedHeader, name_span.clone()));
            HeaderName::Unknown(raw_name.to_ascii_lowercase())
        }
    };

    let value = match name.kind() {
        Some(kind) => parse_header_value(kind, buf, value_span.clone(), config, &mut warnings),
        None => HeaderValue::Opaque,
    };
    trace!(header = %name, value = ?value, "parsed header");

    Some(HeaderField {
        name,
        line_span: line,
        name_span,
        value_span,
        value,
        warnings,
    })
}

/// Dispatch a header value to the parser for its kind
pub fn parse_header_value(
    kind: HeaderKind,
    buf: &[u8],
    value: Range<usize>,
    config: &AnalyzerConfig,
    warnings: &mut Vec<Warning>,
) -> HeaderValue {
    let (start, end) = (value.start, value.end);
    let parsed = match kind {
        HeaderKind::CallId => Some(HeaderValue::CallId(text(buf, value))),
        HeaderKind::CSeq => {
            parse_cseq(buf, start, end, config.max_cseq_method_len, warnings).map(HeaderValue::CSeq)
        }
        HeaderKind::RAck => parse_rack(buf, start, end, warnings).map(HeaderValue::RAck),
        HeaderKind::To
        | HeaderKind::From
        | HeaderKind::PAssertedIdentity
        | HeaderKind::PPreferredIdentity => parse_address(buf, start, end).map(HeaderValue::Address),
        HeaderKind::Contact => Some(HeaderValue::Contact(parse_contact(buf, start, end, warnings))),
        HeaderKind::Via => Some(HeaderValue::Via(parse_via(buf, start, end, warnings))),
        HeaderKind::ContentLength
        | HeaderKind::MaxForwards
        | HeaderKind::MaxBreadth
        | HeaderKind::RSeq
        | HeaderKind::Expires
        | HeaderKind::MinExpires => parse_integer(buf, start, end, warnings).map(HeaderValue::Integer),
        HeaderKind::ContentType => parse_content_type(buf, start, end).map(HeaderValue::ContentType),
        HeaderKind::Reason => parse_reason(buf, start, end).map(HeaderValue::Reason),
        HeaderKind::SessionId => Some(HeaderValue::SessionId(parse_session_id(buf, start, end))),
        HeaderKind::PAccessNetworkInfo => {
            parse_access_network_info(buf, start, end).map(HeaderValue::AccessNetworkInfo)
        }
        kind if kind.is_route_list() => Some(HeaderValue::UriList(parse_uri_list(buf, start, end, warnings))),
        kind if kind.is_auth() => Some(HeaderValue::Auth(parse_auth(
            buf,
            start,
            end,
            kind != HeaderKind::AuthenticationInfo,
            warnings,
        ))),
        kind if kind.is_security_mechanism() => Some(HeaderValue::SecurityMechanisms(
            parse_security_mechanisms(buf, start, end, warnings),
        )),
        _ => None,
    };
    parsed.unwrap_or(HeaderValue::Opaque)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UriOffsets;

    fn header(line: &[u8]) -> HeaderField {
        parse_header_line(line, 0..line.len(), &AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_compact_and_full_names() {
        let field = header(b"v: SIP/2.0/UDP host;branch=z9hG4bK1");
        assert_eq!(field.kind(), Some(HeaderKind::Via));
        assert!(matches!(field.value, HeaderValue::Via(ref v) if v.len() == 1));

        let field = header(b"Content-Length : 0");
        assert_eq!(field.kind(), Some(HeaderKind::ContentLength));
        assert_eq!(field.value, HeaderValue::Integer(0));
    }

    #[test]
    fn test_value_span_is_trimmed() {
        let line = b"Subject:   lunch  ";
        let field = header(line);
        assert_eq!(field.raw_value(line), b"lunch");
        assert_eq!(field.value, HeaderValue::Opaque);
    }

    #[test]
    fn test_unknown_header_is_kept() {
        let line = b"X-Custom-Thing: hello";
        let field = header(line);
        assert_eq!(field.name, HeaderName::Unknown("x-custom-thing".to_string()));
        assert_eq!(field.warnings[0].kind, WarningKind::UnrecognizedHeader);
        assert_eq!(field.raw_value(line), b"hello");
    }

    #[test]
    fn test_custom_header_is_not_flagged() {
        let config = AnalyzerConfig::default().with_custom_header("X-Trace-Id");
        let line = b"x-trace-id: 42";
        let field = parse_header_line(line, 0..line.len(), &config).unwrap();
        assert_eq!(field.name, HeaderName::Custom("x-trace-id".to_string()));
        assert!(field.warnings.is_empty());
    }

    #[test]
    fn test_line_without_colon() {
        let line = b"this is not a header";
        assert!(parse_header_line(line, 0..line.len(), &AnalyzerConfig::default()).is_none());
    }

    #[test]
    fn test_malformed_cseq_falls_back_to_opaque() {
        let field = header(b"CSeq: 12");
        assert_eq!(field.value, HeaderValue::Opaque);
        assert_eq!(field.warnings[0].kind, WarningKind::MalformedCSeq);
    }

    #[test]
    fn test_authentication_info_has_no_scheme() {
        let field = header(b"Authentication-Info: nextnonce=\"abc\"");
        match field.value {
            HeaderValue::Auth(auth) => {
                assert!(auth.scheme.is_none());
                assert_eq!(auth.params.len(), 1);
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_folded_contact_list() {
        let line = b"Contact: <sip:a@x.com>,\r\n <sip:b@y.com>";
        match header(line).value {
            HeaderValue::Contact(list) => {
                assert_eq!(list.contacts.len(), 2);
                assert!(list.contacts[1].uri.display_name.is_none());
                assert_eq!(UriOffsets::text(line, &list.contacts[1].uri.user), Some("b"));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_value_starting_on_continuation_line() {
        let line = b"From:\r\n \"Alice\" <sip:alice@a.com>;tag=1";
        let field = header(line);
        assert_eq!(field.raw_value(line), b"\"Alice\" <sip:alice@a.com>;tag=1");
        match field.value {
            HeaderValue::Address(address) => {
                assert_eq!(UriOffsets::text(line, &address.uri.display_name), Some("Alice"));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }
}
