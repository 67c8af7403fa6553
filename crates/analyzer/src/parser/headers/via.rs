use crate::error::{Warning, WarningKind};
use crate::parser::utils::{find_any, find_byte, skip_wsp, text};
use crate::types::{ViaEntry, ViaParam, ViaParamName};
use tracing::trace;

/// Via               =  ( "Via" / "v" ) HCOLON via-parm *(COMMA via-parm)
/// via-parm          =  sent-protocol LWS sent-by *( SEMI via-params )
/// sent-protocol     =  protocol-name SLASH protocol-version SLASH transport
/// sent-by           =  host [ COLON port ]
///
/// A colon after the host with no port digits stops parsing of the header.
pub fn parse_via(buf: &[u8], start: usize, end: usize, warnings: &mut Vec<Warning>) -> Vec<ViaEntry> {
    let end = end.min(buf.len());
    let mut entries = Vec::new();
    let mut current = start;

    loop {
        current = skip_wsp(buf, current, end);
        if current >= end {
            break;
        }
        let mut entry = ViaEntry::default();

        // Skip "SIP/2.0/", tolerating whitespace around the slashes
        current = match find_byte(buf, current, end, b'/')
            .and_then(|first| find_byte(buf, first + 1, end, b'/'))
        {
            Some(second) => skip_wsp(buf, second + 1, end),
            None => end,
        };

        current = parse_transports(buf, current, end, &mut entry);
        current = skip_wsp(buf, current, end);

        let (sent_by_end, sent_by) = scan_sent_by(buf, current, end);
        entry.sent_by = sent_by;
        current = skip_wsp(buf, sent_by_end, end);

        if buf.get(current) == Some(&b':') {
            let port_start = skip_wsp(buf, current + 1, end);
            let digits = buf[port_start..end]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if digits == 0 {
                warnings.push(Warning::new(WarningKind::MalformedViaPort, current..end));
                entries.push(entry);
                return entries;
            }
            entry.sent_by_port = text(buf, port_start..port_start + digits).parse().ok();
            current = port_start + digits;
        }

        current = parse_params(buf, current, end, &mut entry);
        entries.push(entry);

        current = skip_wsp(buf, current, end);
        if buf.get(current) == Some(&b',') && current < end {
            current += 1;
            continue;
        }
        break;
    }

    entries
}

/// One or more transport tokens separated by `/`
fn parse_transports(buf: &[u8], mut current: usize, end: usize, entry: &mut ViaEntry) -> usize {
    while current < end {
        let token_start = current;
        match find_any(buf, current, end, b"\t /\r\n") {
            Some((pos, c)) => {
                if pos > token_start {
                    entry.transports.push(token_start..pos);
                }
                if c == b'/' {
                    current = pos + 1;
                    continue;
                }
                current = skip_wsp(buf, pos, end);
                if buf.get(current) == Some(&b'/') && current < end {
                    current += 1;
                    continue;
                }
                break;
            }
            None => {
                entry.transports.push(token_start..end);
                current = end;
            }
        }
    }
    current
}

/// Host part of sent-by, IPv6 references reported without brackets
fn scan_sent_by(buf: &[u8], start: usize, end: usize) -> (usize, Option<std::ops::Range<usize>>) {
    let mut in_reference = false;
    let mut ipv6 = false;
    let mut current = start;
    while current < end {
        match buf[current] {
            b'[' => {
                in_reference = true;
                ipv6 = true;
            }
            b']' => in_reference = false,
            b':' if !in_reference => break,
            b' ' | b'\t' | b'\r' | b'\n' | b';' | b',' => break,
            _ => {}
        }
        current += 1;
    }

    let host = if ipv6 && current - start >= 2 && buf[current - 1] == b']' {
        start + 1..current - 1
    } else {
        start..current
    };
    (current, (!host.is_empty()).then_some(host))
}

/// `;name[=value]` parameters up to the next via-parm or line end
fn parse_params(buf: &[u8], mut current: usize, end: usize, entry: &mut ViaEntry) -> usize {
    loop {
        current = skip_wsp(buf, current, end);
        if current >= end || buf[current] != b';' {
            return current;
        }
        let name_start = skip_wsp(buf, current + 1, end);
        let name_end = buf[name_start..end]
            .iter()
            .position(|&c| !(c.is_ascii_alphabetic() || c == b'-'))
            .map_or(end, |i| name_start + i);
        let has_value = buf.get(name_end) == Some(&b'=') && name_end < end;

        let param_end = find_any(buf, name_end, end, b"\t;, \r\n").map_or(end, |(pos, _)| pos);
        let name = ViaParamName::from_name(&text(buf, name_start..name_end));
        trace!(param = %text(buf, name_start..param_end), known = name.is_some(), "via parameter");

        entry.params.push(ViaParam {
            name,
            span: name_start..param_end,
            value: has_value.then(|| name_end + 1..param_end),
        });
        current = param_end;
    }
}
