use crate::parser::utils::{find_byte, find_ignore_case, leading_u32, skip_wsp, trim_wsp_end};
use crate::types::ReasonValue;

/// Reason        =  "Reason" HCOLON reason-value *(COMMA reason-value)
/// reason-value  =  protocol *(SEMI reason-params)
///
/// Only the first reason-value is decoded. The cause is read for Q.850 only.
pub fn parse_reason(buf: &[u8], start: usize, end: usize) -> Option<ReasonValue> {
    let end = end.min(buf.len());
    let protocol_start = skip_wsp(buf, start, end);
    let protocol_end = trim_wsp_end(
        buf,
        protocol_start,
        find_byte(buf, protocol_start, end, b';').unwrap_or(end),
    );
    if protocol_end <= protocol_start {
        return None;
    }

    let protocol = &buf[protocol_start..protocol_end];
    let cause = if protocol.eq_ignore_ascii_case(b"Q.850") {
        find_ignore_case(buf, protocol_end, end, b"cause")
            .and_then(|pos| find_byte(buf, pos, end, b'='))
            .and_then(|equals| {
                let digits_start = skip_wsp(buf, equals + 1, end);
                leading_u32(&buf[digits_start..end])
            })
    } else {
        None
    };

    Some(ReasonValue {
        protocol: protocol_start..protocol_end,
        cause,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q850_cause() {
        let buf = br#"Q.850;cause=16;text="Normal call clearing""#;
        let reason = parse_reason(buf, 0, buf.len()).unwrap();
        assert_eq!(&buf[reason.protocol], b"Q.850");
        assert_eq!(reason.cause, Some(16));
    }

    #[test]
    fn test_sip_reason_cause_is_not_decoded() {
        let buf = br#"SIP ;cause=200 ;text="Call completed elsewhere""#;
        let reason = parse_reason(buf, 0, buf.len()).unwrap();
        assert_eq!(&buf[reason.protocol], b"SIP");
        assert_eq!(reason.cause, None);
    }

    #[test]
    fn test_empty_reason() {
        assert!(parse_reason(b"  ", 0, 2).is_none());
    }
}
