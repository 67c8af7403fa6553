//! Message assembly
//!
//! [`dissect`] drives the line scanner and the header parsers over one SIP
//! message: start line, header block up to the blank line, then the body as
//! bounded by `Content-Length`. It never touches correlation state, so a
//! need-more-data outcome leaves nothing to undo.

use crate::config::AnalyzerConfig;
use crate::error::{Warning, WarningKind};
use crate::parser::line::{classify_line, contains_nul, find_line, find_logical_line, LineKind};
use crate::parser::{parse_header_line, parse_uri};
use crate::types::{
    CSeqValue, HeaderField, HeaderKind, HeaderValue, Method, Transport, UriOffsets,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, warn};

/// Outcome of dissecting the bytes at one offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dissection {
    /// A complete request or response
    Message(Box<SipMessage>),
    /// The caller allowed non-SIP text to follow a message; everything up
    /// to `consumed` was taken as continuation data.
    Continuation { consumed: usize },
    /// The stream needs more bytes. `consumed` is the offset where the
    /// incomplete message starts.
    NeedMoreData { consumed: usize },
    /// Not a SIP message
    NotSip,
}

/// Contact bookkeeping used by the registration summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub star: bool,
    pub count: usize,
    pub expires_zero: usize,
    pub expires_unknown: usize,
}

/// A dissected SIP request or response. All ranges are absolute offsets
/// into the buffer handed to [`dissect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipMessage {
    /// Start line, without its terminator
    pub start_line: Range<usize>,
    pub line: LineKind,
    pub request_uri: Option<UriOffsets>,
    pub headers: Vec<HeaderField>,
    /// Message-level warnings; header warnings stay on their header
    pub warnings: Vec<Warning>,
    pub call_id: Option<String>,
    pub cseq: Option<CSeqValue>,
    pub content_length: Option<u32>,
    pub body: Range<usize>,
    pub contacts: ContactSummary,
    /// An `Expires: 0` header is present
    pub expires_is_0: bool,
    /// INVITE, SUBSCRIBE or REFER carrying a To-tag
    pub in_dialog: bool,
    /// The blank line ending the header block was found
    pub headers_terminated: bool,
}

impl SipMessage {
    /// Offset one past the last byte of this message
    pub fn end(&self) -> usize {
        self.body.end
    }

    pub fn len(&self) -> usize {
        self.body.end - self.start_line.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_request(&self) -> bool {
        self.line.is_request()
    }

    pub fn method(&self) -> Option<&Method> {
        match &self.line {
            LineKind::RequestLine { method, .. } => Some(method),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.line {
            LineKind::StatusLine { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn reason_phrase<'a>(&self, buf: &'a [u8]) -> Option<&'a [u8]> {
        match &self.line {
            LineKind::StatusLine { reason, .. } => buf.get(reason.clone()),
            _ => None,
        }
    }

    /// First header of `kind`
    pub fn header(&self, kind: HeaderKind) -> Option<&HeaderField> {
        self.headers.iter().find(|h| h.kind() == Some(kind))
    }

    /// Every header of `kind`, in message order
    pub fn headers_of(&self, kind: HeaderKind) -> impl Iterator<Item = &HeaderField> {
        self.headers.iter().filter(move |h| h.kind() == Some(kind))
    }

    /// Header and message warnings together
    pub fn all_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings
            .iter()
            .chain(self.headers.iter().flat_map(|h| h.warnings.iter()))
    }
}

#[inline]
fn is_print(c: u8) -> bool {
    (0x20..0x7f).contains(&c)
}

/// Dissect the message starting at `offset`.
///
/// `buf` must already be cut to the reported length. With
/// `allow_continuation` a start line that is neither a request nor a status
/// line is taken as continuation data instead of rejecting the buffer.
pub fn dissect(
    buf: &[u8],
    offset: usize,
    transport: Transport,
    config: &AnalyzerConfig,
    allow_continuation: bool,
) -> Dissection {
    let offset = offset.min(buf.len());
    if !allow_continuation && buf.get(offset).map_or(true, |&c| !is_print(c)) {
        return Dissection::NotSip;
    }

    let first = find_line(buf, offset);
    if first.is_empty() || contains_nul(&buf[first.span()]) {
        return Dissection::NotSip;
    }

    let line = classify_line(&buf[first.span()], config.strict_sip_version).offset_by(first.start);
    debug!(offset, kind = ?line, "classified start line");
    if line == LineKind::Other {
        return if allow_continuation {
            Dissection::Continuation { consumed: buf.len() }
        } else {
            Dissection::NotSip
        };
    }

    let stream = transport.is_stream();
    let mut message = SipMessage {
        start_line: first.span(),
        request_uri: None,
        line,
        headers: Vec::new(),
        warnings: Vec::new(),
        call_id: None,
        cseq: None,
        content_length: None,
        body: 0..0,
        contacts: ContactSummary::default(),
        expires_is_0: false,
        in_dialog: false,
        headers_terminated: false,
    };
    if let LineKind::RequestLine { request_uri, .. } = &message.line {
        message.request_uri = parse_uri(buf, request_uri.start, request_uri.end, Some(request_uri.end));
    }

    let mut current = first.next;
    while current < buf.len() {
        let header_line = find_logical_line(buf, current);
        if header_line.is_empty() {
            current = header_line.next;
            message.headers_terminated = true;
            break;
        }
        match parse_header_line(buf, header_line.span(), config) {
            Some(field) => message.headers.push(field),
            None => message
                .warnings
                .push(Warning::new(WarningKind::HeaderNoColon, header_line.span())),
        }
        current = header_line.next;
    }

    if !message.headers_terminated {
        if stream && config.desegment_headers {
            debug!(offset, "header block incomplete, waiting for more data");
            return Dissection::NeedMoreData { consumed: offset };
        }
        let last = message.headers.last().map_or(first.span(), |h| h.line_span.clone());
        message
            .warnings
            .push(Warning::new(WarningKind::HeaderNotTerminated, last));
    }

    summarize_headers(&mut message, config);

    let body_start = current.min(buf.len());
    let available = buf.len() - body_start;
    let body_len = match message.content_length {
        Some(declared) if declared as usize > available => {
            if stream && config.desegment_body {
                debug!(offset, declared, available, "body incomplete, waiting for more data");
                return Dissection::NeedMoreData { consumed: offset };
            }
            message.warnings.push(Warning::new(
                WarningKind::ContentLengthMismatch,
                body_start..buf.len(),
            ));
            available
        }
        Some(declared) => declared as usize,
        None => available,
    };
    message.body = body_start..body_start + body_len;

    for warning in message.all_warnings() {
        warn!(kind = %warning.kind, span = ?warning.span, "malformed SIP input");
    }

    Dissection::Message(Box::new(message))
}

/// Pull the values the correlator and the summaries need out of the headers
fn summarize_headers(message: &mut SipMessage, config: &AnalyzerConfig) {
    let mut to_tag = false;
    for field in &message.headers {
        match (&field.value, field.kind()) {
            (HeaderValue::CallId(call_id), _) if message.call_id.is_none() => {
                message.call_id = Some(call_id.clone());
            }
            (HeaderValue::CSeq(cseq), _) if message.cseq.is_none() => {
                message.cseq = Some(cseq.clone());
            }
            (HeaderValue::Integer(n), Some(HeaderKind::ContentLength)) => {
                message.content_length = Some(*n);
            }
            (HeaderValue::Integer(0), Some(HeaderKind::Expires)) => message.expires_is_0 = true,
            (HeaderValue::Address(address), Some(HeaderKind::To)) => to_tag |= address.tag.is_some(),
            (HeaderValue::Contact(list), _) => {
                message.contacts.star |= list.star;
                message.contacts.count += list.contacts.len();
                message.contacts.expires_zero += list.expires_zero();
                message.contacts.expires_unknown += list.expires_unknown();
            }
            _ => {}
        }
    }

    if let Some(call_id) = &message.call_id {
        if call_id.len() > config.max_call_id_len {
            debug!(len = call_id.len(), "Call-ID longer than the correlation key bound");
        }
    }

    message.in_dialog = to_tag
        && matches!(
            message.method(),
            Some(Method::Invite) | Some(Method::Subscribe) | Some(Method::Refer)
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(buf: &[u8]) -> SipMessage {
        match dissect(buf, 0, Transport::Udp, &AnalyzerConfig::default(), false) {
            Dissection::Message(message) => *message,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    const INVITE: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
Content-Type: application/sdp\r\n\
Content-Length: 4\r\n\
\r\n\
v=0\n";

    #[test]
    fn test_invite() {
        let msg = message(INVITE);
        assert!(msg.is_request());
        assert_eq!(msg.method(), Some(&Method::Invite));
        assert_eq!(msg.headers.len(), 9);
        assert_eq!(msg.call_id.as_deref(), Some("a84b4c76e66710@pc33.atlanta.com"));
        assert_eq!(msg.cseq.as_ref().map(|c| c.number), Some(314159));
        assert_eq!(msg.content_length, Some(4));
        assert_eq!(&INVITE[msg.body.clone()], b"v=0\n");
        assert_eq!(msg.end(), INVITE.len());
        assert!(msg.headers_terminated);
        assert!(!msg.in_dialog);
        assert_eq!(msg.contacts.count, 1);
        let uri = msg.request_uri.as_ref().unwrap();
        assert_eq!(UriOffsets::text(INVITE, &uri.host), Some("biloxi.com"));
    }

    #[test]
    fn test_response() {
        let buf = b"SIP/2.0 180 Ringing\r\nCall-ID: x\r\nCSeq: 1 INVITE\r\nContent-Length: 0\r\n\r\n";
        let msg = message(buf);
        assert_eq!(msg.status_code(), Some(180));
        assert_eq!(msg.reason_phrase(buf), Some(&b"Ringing"[..]));
        assert!(msg.body.is_empty());
    }

    #[test]
    fn test_not_sip() {
        let config = AnalyzerConfig::default();
        let udp = |buf: &[u8]| dissect(buf, 0, Transport::Udp, &config, false);
        assert_eq!(udp(b"GET / HTTP/1.1\r\n\r\n"), Dissection::NotSip);
        assert_eq!(udp(b"\x01INVITE sip:a@b SIP/2.0\r\n\r\n"), Dissection::NotSip);
        assert_eq!(udp(b"\r\nINVITE sip:a@b SIP/2.0\r\n"), Dissection::NotSip);
        assert_eq!(udp(b"INVITE sip:a@b\0 SIP/2.0\r\n\r\n"), Dissection::NotSip);
        assert_eq!(udp(b""), Dissection::NotSip);
    }

    #[test]
    fn test_continuation() {
        let config = AnalyzerConfig::default();
        let buf = b"trailing garbage\r\n";
        assert_eq!(
            dissect(buf, 0, Transport::Tcp, &config, true),
            Dissection::Continuation { consumed: buf.len() }
        );
    }

    #[test]
    fn test_header_not_terminated() {
        let buf = b"OPTIONS sip:a@b SIP/2.0\r\nCall-ID: x\r\nCSeq: 1 OPTIONS\r\n";
        let msg = message(buf);
        assert!(!msg.headers_terminated);
        assert_eq!(msg.headers.len(), 2);
        assert!(msg
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::HeaderNotTerminated));
    }

    #[test]
    fn test_header_without_colon_is_skipped() {
        let buf = b"OPTIONS sip:a@b SIP/2.0\r\nbogus line\r\nCall-ID: x\r\n\r\n";
        let msg = message(buf);
        assert_eq!(msg.headers.len(), 1);
        assert_eq!(msg.warnings[0].kind, WarningKind::HeaderNoColon);
        assert_eq!(msg.call_id.as_deref(), Some("x"));
    }

    #[test]
    fn test_content_length_larger_than_datagram() {
        let buf = b"MESSAGE sip:a@b SIP/2.0\r\nContent-Length: 100\r\n\r\nhello";
        let msg = message(buf);
        assert_eq!(&buf[msg.body.clone()], b"hello");
        assert!(msg
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::ContentLengthMismatch));
    }

    #[test]
    fn test_tcp_waits_for_headers_and_body() {
        let config = AnalyzerConfig::default();
        let partial_headers = b"INVITE sip:a@b SIP/2.0\r\nCall-ID: x\r\n";
        assert_eq!(
            dissect(partial_headers, 0, Transport::Tcp, &config, false),
            Dissection::NeedMoreData { consumed: 0 }
        );
        let partial_body = b"INVITE sip:a@b SIP/2.0\r\nContent-Length: 10\r\n\r\nabc";
        assert_eq!(
            dissect(partial_body, 0, Transport::Tcp, &config, false),
            Dissection::NeedMoreData { consumed: 0 }
        );

        let relaxed = AnalyzerConfig::default().with_desegmentation(false, false);
        assert!(matches!(
            dissect(partial_body, 0, Transport::Tcp, &relaxed, false),
            Dissection::Message(_)
        ));
    }

    #[test]
    fn test_to_tag_marks_in_dialog() {
        let buf = b"INVITE sip:a@b SIP/2.0\r\nTo: <sip:a@b>;tag=xyz\r\nCall-ID: x\r\n\r\n";
        assert!(message(buf).in_dialog);
        let buf = b"MESSAGE sip:a@b SIP/2.0\r\nTo: <sip:a@b>;tag=xyz\r\n\r\n";
        assert!(!message(buf).in_dialog);
    }

    #[test]
    fn test_compact_headers_feed_summary() {
        let buf = b"REGISTER sip:reg SIP/2.0\r\ni: abc\r\nm: *\r\nExpires: 0\r\nl: 0\r\n\r\n";
        let msg = message(buf);
        assert_eq!(msg.call_id.as_deref(), Some("abc"));
        assert!(msg.contacts.star);
        assert!(msg.expires_is_0);
        assert_eq!(msg.content_length, Some(0));
    }
}
