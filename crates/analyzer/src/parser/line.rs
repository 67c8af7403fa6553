//! Line and token scanning
//!
//! Lines end at CR, LF or CRLF. A header line followed by lines starting
//! with SP or HTAB is folded into one logical line. The first line of a
//! message is classified by [`classify_line`].

use super::utils::{is_wsp, ParseResult};
use crate::types::Method;
use nom::{
    bytes::complete::{tag, take_till, take_till1},
    combinator::rest,
    sequence::tuple,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The SIP version token accepted in strict mode
pub const SIP2_VERSION: &[u8] = b"SIP/2.0";

/// One physical or logical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub start: usize,
    /// End of the line content, before the terminator
    pub end: usize,
    /// Start of the following line
    pub next: usize,
    /// A line terminator was found before the end of the buffer
    pub terminated: bool,
}

impl Line {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Find the line that starts at `offset`.
///
/// Without a terminator the line runs to the end of `buf`.
pub fn find_line(buf: &[u8], offset: usize) -> Line {
    let offset = offset.min(buf.len());
    match buf[offset..].iter().position(|&c| c == b'\r' || c == b'\n') {
        Some(i) => {
            let end = offset + i;
            let next = if buf[end] == b'\r' && buf.get(end + 1) == Some(&b'\n') {
                end + 2
            } else {
                end + 1
            };
            Line {
                start: offset,
                end,
                next,
                terminated: true,
            }
        }
        None => Line {
            start: offset,
            end: buf.len(),
            next: buf.len(),
            terminated: false,
        },
    }
}

/// Find the header line at `offset`, folding continuation lines into it
pub fn find_logical_line(buf: &[u8], offset: usize) -> Line {
    let mut line = find_line(buf, offset);
    if line.is_empty() {
        return line;
    }
    while line.terminated && buf.get(line.next).map_or(false, |&c| is_wsp(c)) {
        let continuation = find_line(buf, line.next);
        line.end = continuation.end;
        line.next = continuation.next;
        line.terminated = continuation.terminated;
    }
    line
}

/// Whether the line holds a NUL byte
pub fn contains_nul(line: &[u8]) -> bool {
    line.contains(&0)
}

/// Classification of the first line of a message.
///
/// Ranges are relative to the classified slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    RequestLine {
        method: Method,
        method_span: Range<usize>,
        request_uri: Range<usize>,
        version: Range<usize>,
    },
    StatusLine {
        version: Range<usize>,
        code: u16,
        reason: Range<usize>,
    },
    Other,
}

impl LineKind {
    pub fn is_request(&self) -> bool {
        matches!(self, LineKind::RequestLine { .. })
    }

    pub fn is_status(&self) -> bool {
        matches!(self, LineKind::StatusLine { .. })
    }

    /// Shift every range by `base`
    pub fn offset_by(self, base: usize) -> LineKind {
        let shift = |r: Range<usize>| r.start + base..r.end + base;
        match self {
            LineKind::RequestLine {
                method,
                method_span,
                request_uri,
                version,
            } => LineKind::RequestLine {
                method,
                method_span: shift(method_span),
                request_uri: shift(request_uri),
                version: shift(version),
            },
            LineKind::StatusLine {
                version,
                code,
                reason,
            } => LineKind::StatusLine {
                version: shift(version),
                code,
                reason: shift(reason),
            },
            LineKind::Other => LineKind::Other,
        }
    }
}

fn is_version(token: &[u8], strict: bool) -> bool {
    if strict {
        token == SIP2_VERSION
    } else {
        token.len() >= 4 && token[..4].eq_ignore_ascii_case(b"SIP/")
    }
}

/// Split a line into `token1 SP token2 SP rest`
fn three_tokens(line: &[u8]) -> ParseResult<(&[u8], &[u8], &[u8])> {
    let (remaining, (first, _, second, _, third)) = tuple((
        take_till1(|c: u8| c == b' '),
        tag(b" "),
        take_till(|c: u8| c == b' '),
        tag(b" "),
        rest,
    ))(line)?;
    Ok((remaining, (first, second, third)))
}

/// Classify a start line as Request-Line, Status-Line or other text
pub fn classify_line(line: &[u8], strict_version: bool) -> LineKind {
    let (first, second, third) = match three_tokens(line) {
        Ok((_, tokens)) => tokens,
        Err(_) => return LineKind::Other,
    };
    let second_start = first.len() + 1;
    let third_start = second_start + second.len() + 1;

    if is_version(first, strict_version) {
        if second.len() != 3 || !second.iter().all(u8::is_ascii_digit) {
            return LineKind::Other;
        }
        let code = second
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        if !(100..=699).contains(&code) {
            return LineKind::Other;
        }
        return LineKind::StatusLine {
            version: 0..first.len(),
            code,
            reason: third_start..line.len(),
        };
    }

    if second.len() < 3 || !second[1..].contains(&b':') {
        return LineKind::Other;
    }
    if !is_version(third, strict_version) {
        return LineKind::Other;
    }
    LineKind::RequestLine {
        method: Method::from_bytes(first),
        method_span: 0..first.len(),
        request_uri: second_start..second_start + second.len(),
        version: third_start..line.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_line_terminators() {
        let buf = b"one\r\ntwo\nthree\rfour";
        let l1 = find_line(buf, 0);
        assert_eq!((l1.start, l1.end, l1.next), (0, 3, 5));
        let l2 = find_line(buf, l1.next);
        assert_eq!(&buf[l2.span()], b"two");
        let l3 = find_line(buf, l2.next);
        assert_eq!(&buf[l3.span()], b"three");
        let l4 = find_line(buf, l3.next);
        assert_eq!(&buf[l4.span()], b"four");
        assert!(!l4.terminated);
    }

    #[test]
    fn test_logical_line_folds_continuations() {
        let buf = b"Via: SIP/2.0/UDP a,\r\n  SIP/2.0/UDP b\r\nTo: x\r\n";
        let line = find_logical_line(buf, 0);
        assert_eq!(&buf[line.span()], b"Via: SIP/2.0/UDP a,\r\n  SIP/2.0/UDP b");
        let next = find_logical_line(buf, line.next);
        assert_eq!(&buf[next.span()], b"To: x");
    }

    #[test]
    fn test_empty_line_is_not_folded() {
        let buf = b"\r\n body";
        let line = find_logical_line(buf, 0);
        assert!(line.is_empty());
        assert_eq!(line.next, 2);
    }

    #[test]
    fn test_classify_request_line() {
        let line = b"INVITE sip:bob@biloxi.com SIP/2.0";
        match classify_line(line, true) {
            LineKind::RequestLine {
                method,
                method_span,
                request_uri,
                version,
            } => {
                assert_eq!(method, Method::Invite);
                assert_eq!(&line[method_span], b"INVITE");
                assert_eq!(&line[request_uri], b"sip:bob@biloxi.com");
                assert_eq!(&line[version], b"SIP/2.0");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_status_line() {
        let line = b"SIP/2.0 180 Ringing";
        match classify_line(line, true) {
            LineKind::StatusLine { code, reason, .. } => {
                assert_eq!(code, 180);
                assert_eq!(&line[reason], b"Ringing");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_line_with_empty_reason() {
        assert!(classify_line(b"SIP/2.0 200 ", true).is_status());
        assert!(!classify_line(b"SIP/2.0 200", true).is_status());
    }

    #[test]
    fn test_other_lines() {
        assert_eq!(classify_line(b"", true), LineKind::Other);
        assert_eq!(classify_line(b" INVITE sip:a SIP/2.0", true), LineKind::Other);
        assert_eq!(classify_line(b"SIP/2.0 2000 OK", true), LineKind::Other);
        assert_eq!(classify_line(b"SIP/2.0 20a OK", true), LineKind::Other);
        assert_eq!(classify_line(b"SIP/2.0 099 Low", true), LineKind::Other);
        assert_eq!(classify_line(b"SIP/2.0 700 High", true), LineKind::Other);
        assert_eq!(classify_line(b"GET /index.html HTTP/1.1", true), LineKind::Other);
        assert_eq!(classify_line(b"INVITE abc SIP/2.0", true), LineKind::Other);
        assert!(classify_line(b"INVITE ab: SIP/2.0", true).is_request());
        assert_eq!(classify_line(b"INVITE :abc SIP/2.0", true), LineKind::Other);
    }

    #[test]
    fn test_version_strictness() {
        assert_eq!(classify_line(b"sip/2.0 200 OK", true), LineKind::Other);
        assert!(classify_line(b"sip/2.0 200 OK", false).is_status());
        assert!(classify_line(b"SIP/3.0 200 OK", false).is_status());
        assert!(!classify_line(b"OPTIONS sip:a@b SIP/2.1", true).is_request());
        assert!(classify_line(b"OPTIONS sip:a@b SIP/2.1", false).is_request());
    }

    #[test]
    fn test_unknown_method_is_still_a_request() {
        match classify_line(b"FOO sip:a@b SIP/2.0", true) {
            LineKind::RequestLine { method, .. } => assert!(!method.is_known()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_offset_by() {
        let kind = classify_line(b"SIP/2.0 200 OK", true).offset_by(10);
        assert_eq!(
            kind,
            LineKind::StatusLine {
                version: 10..17,
                code: 200,
                reason: 22..24
            }
        );
    }
}
