use crate::parser::utils::{find_byte, skip_wsp, text, trim_wsp_end};
use crate::types::SessionIdValue;
use std::ops::Range;

/// session-id-value  =  local-uuid *(SEMI sess-id-param)
/// remote-param      =  "remote" EQUAL remote-uuid
/// sess-uuid         =  32(DIGIT / %x61-66)
///
/// Both identifiers are decoded only when the local id and the `remote`
/// value are each exactly 32 hex digits; otherwise parameters stay opaque.
pub fn parse_session_id(buf: &[u8], start: usize, end: usize) -> SessionIdValue {
    let end = end.min(buf.len());
    let local_start = skip_wsp(buf, start, end);
    let semi = find_byte(buf, local_start, end, b';');
    let local = local_start..trim_wsp_end(buf, local_start, semi.unwrap_or(end));
    let local_id = parse_uuid(&buf[local.clone()]);

    let mut value = SessionIdValue {
        local,
        local_uuid: None,
        remote_uuid: None,
        params: Vec::new(),
    };

    let mut next = semi;
    while let Some(pos) = next {
        let param_start = skip_wsp(buf, pos + 1, end);
        next = find_byte(buf, param_start, end, b';');
        let param_end = trim_wsp_end(buf, param_start, next.unwrap_or(end));
        if param_end <= param_start {
            continue;
        }

        if let (Some(local_id), Some(remote_id)) = (local_id, remote_param(buf, param_start..param_end)) {
            value.local_uuid = Some(local_id);
            value.remote_uuid = Some(remote_id);
        } else {
            value.params.push(param_start..param_end);
        }
    }

    value
}

/// `remote=<32 hex>` decoded, `None` for anything else
fn remote_param(buf: &[u8], span: Range<usize>) -> Option<u128> {
    let equals = find_byte(buf, span.start, span.end, b'=')?;
    let name = text(buf, span.start..trim_wsp_end(buf, span.start, equals));
    if !name.eq_ignore_ascii_case("remote") {
        return None;
    }
    let value_start = skip_wsp(buf, equals + 1, span.end);
    parse_uuid(&buf[value_start..span.end])
}

fn parse_uuid(hex: &[u8]) -> Option<u128> {
    if hex.len() != 32 || !hex.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u128::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()
}
