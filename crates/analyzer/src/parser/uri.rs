//! `name-addr` / `addr-spec` scanning
//!
//! ```text
//! name-addr     =  [ display-name ] LAQUOT addr-spec RAQUOT
//! addr-spec     =  SIP-URI / SIPS-URI / absoluteURI
//! display-name  =  *(token LWS)/ quoted-string
//! ```
//!
//! The scanner only locates the parts of a URI, it does not validate them.
//! Whenever the parts cannot be delimited consistently the whole URI is
//! reported as not found and callers render nothing for it.

use super::utils::{
    find_any, find_byte, find_closing_quote, skip_wsp, starts_with_ignore_case, trim_wsp_end,
};
use crate::types::UriOffsets;
use std::ops::Range;
use tracing::trace;

/// Locate a `name-addr` or `addr-spec` starting at `start`, never reading at or beyond `end`
pub fn parse_name_addr_or_addr_spec(buf: &[u8], start: usize, end: usize) -> Option<UriOffsets> {
    let end = end.min(buf.len());
    let current = skip_wsp(buf, start, end);
    if current >= end {
        return None;
    }

    let mut display_name = None;
    let uri_start;
    let angle_quoted;

    match buf[current] {
        b'"' => {
            let close = find_closing_quote(buf, current, end)?;
            display_name = Some(current + 1..close);
            let laquot = find_byte(buf, close, end, b'<')?;
            uri_start = laquot + 1;
            angle_quoted = true;
        }
        b'<' => {
            uri_start = current + 1;
            angle_quoted = true;
        }
        _ => {
            let laquot = find_byte(buf, current, end, b'<');
            let colon = find_byte(buf, current, end, b':');
            match (laquot, colon) {
                (Some(l), Some(c)) if l < c => {
                    display_name = Some(current..trim_wsp_end(buf, current, l));
                    uri_start = l + 1;
                    angle_quoted = true;
                }
                (Some(l), None) => {
                    display_name = Some(current..trim_wsp_end(buf, current, l));
                    uri_start = l + 1;
                    angle_quoted = true;
                }
                (_, Some(_)) => {
                    uri_start = current;
                    angle_quoted = false;
                }
                (None, None) => {
                    trace!(offset = current, "no '<' or ':' in address");
                    return None;
                }
            }
        }
    }

    let uri_end = if angle_quoted {
        Some(find_byte(buf, uri_start, end, b'>')?)
    } else {
        None
    };

    let mut offsets = parse_uri(buf, uri_start, end, uri_end)?;
    let name_addr_end = match uri_end {
        Some(raquot) => raquot + 1,
        None => offsets.uri.as_ref()?.end,
    };
    offsets.name_addr = Some(current..name_addr_end);
    offsets.display_name = display_name;

    offsets.is_consistent().then_some(offsets)
}

/// Locate the parts of a SIP URI.
///
/// `uri_end` is the position of the closing `>` when the URI was
/// angle-quoted. Without it the URI ends at the first `,` or `;` (which
/// start header parameters, not URI parameters) or at `end`.
pub fn parse_uri(buf: &[u8], start: usize, end: usize, uri_end: Option<usize>) -> Option<UriOffsets> {
    let end = end.min(buf.len());
    let uri_start = skip_wsp(buf, start, end);
    if uri_start >= end {
        return None;
    }
    if !starts_with_ignore_case(buf, uri_start, b"sip") {
        trace!(offset = uri_start, "not a sip/sips URI");
        return None;
    }

    let uri_end = match uri_end {
        Some(e) => e,
        None => match find_any(buf, uri_start, end, b",;") {
            Some((pos, _)) => trim_wsp_end(buf, uri_start, pos),
            None => trim_wsp_end(buf, uri_start, end),
        },
    };
    if uri_end < uri_start {
        return None;
    }

    let scheme_colon = find_byte(buf, uri_start, uri_end, b':')?;
    let at = buf[uri_start..uri_end]
        .iter()
        .rposition(|&c| c == b'@')
        .map(|i| uri_start + i);

    let (user, host_start) = match at {
        Some(at) if at > scheme_colon => (Some(scheme_colon + 1..at), at + 1),
        Some(_) => return None,
        None => (None, scheme_colon + 1),
    };

    let mut parameters_start = None;
    let (host_end, port_start) = scan_host(buf, host_start, uri_end, &mut parameters_start);
    let host = strip_brackets(buf, host_start..host_end);

    let mut port = None;
    let mut stop = host_end;
    if let Some(port_start) = port_start {
        let port_end = match find_any(buf, port_start, uri_end, b">,;? \r") {
            Some((pos, b';')) => {
                parameters_start = Some(pos + 1);
                pos
            }
            Some((pos, _)) => pos,
            None => uri_end,
        };
        if port_end > port_start {
            port = Some(port_start..port_end);
        }
        stop = port_end;
    }

    let parameters = parameters_start.map(|p| {
        let params_end = find_byte(buf, p, uri_end, b'?').unwrap_or(uri_end);
        p..params_end.max(p)
    });

    if stop > uri_end {
        return None;
    }

    Some(UriOffsets {
        name_addr: Some(uri_start..uri_end),
        display_name: None,
        uri: Some(uri_start..uri_end),
        user,
        host: Some(host),
        port,
        parameters,
    })
}

/// Scan the host part. Returns the host end and, when a `:` outside an
/// IPv6 literal follows the host, the start of the port.
fn scan_host(
    buf: &[u8],
    host_start: usize,
    uri_end: usize,
    parameters_start: &mut Option<usize>,
) -> (usize, Option<usize>) {
    let mut in_ipv6_bracket = false;
    for pos in host_start..uri_end {
        match buf[pos] {
            b'[' => in_ipv6_bracket = true,
            b']' => in_ipv6_bracket = false,
            b':' if !in_ipv6_bracket => return (pos, Some(pos + 1)),
            b';' => {
                *parameters_start = Some(pos + 1);
                return (pos, None);
            }
            b'>' | b',' | b'?' | b' ' | b'\r' => return (pos, None),
            _ => {}
        }
    }
    (uri_end, None)
}

fn strip_brackets(buf: &[u8], host: Range<usize>) -> Range<usize> {
    if host.len() >= 2 && buf[host.start] == b'[' && buf[host.end - 1] == b']' {
        host.start + 1..host.end - 1
    } else {
        host
    }
}
