use crate::error::{Warning, WarningKind};
use crate::parser::utils::{is_wsp, leading_u32, skip_wsp, trim_wsp_end};
use crate::types::{CSeqValue, Method, RAckValue};

/// CSeq  =  "CSeq" HCOLON 1*DIGIT LWS Method
///
/// A missing method or one longer than `max_method_len` drops the value and
/// records a warning. The rest of the message is unaffected.
pub fn parse_cseq(
    buf: &[u8],
    start: usize,
    end: usize,
    max_method_len: usize,
    warnings: &mut Vec<Warning>,
) -> Option<CSeqValue> {
    let end = end.min(buf.len());
    let number_start = skip_wsp(buf, start, end);
    let digits = buf[number_start..end]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    let number = match leading_u32(&buf[number_start..end]) {
        Some(n) => n,
        None => {
            warnings.push(Warning::new(WarningKind::MalformedCSeq, start..end));
            return None;
        }
    };
    let number_end = number_start + digits;

    let method_start = match buf[number_end..end].iter().position(u8::is_ascii_alphabetic) {
        Some(i) => number_end + i,
        None => {
            warnings.push(Warning::new(WarningKind::MalformedCSeq, start..end));
            return None;
        }
    };
    let method_end = trim_wsp_end(buf, method_start, end);
    if method_end - method_start > max_method_len {
        warnings.push(Warning::new(
            WarningKind::CSeqMethodTooLong,
            method_start..method_end,
        ));
        return None;
    }

    Some(CSeqValue {
        number,
        number_span: number_start..number_end,
        method: Method::from_bytes(&buf[method_start..method_end]),
        method_span: method_start..method_end,
    })
}

/// RAck  =  "RAck" HCOLON response-num LWS CSeq-num LWS Method
pub fn parse_rack(
    buf: &[u8],
    start: usize,
    end: usize,
    warnings: &mut Vec<Warning>,
) -> Option<RAckValue> {
    let end = end.min(buf.len());
    let mut tokens = buf[start.min(end)..end]
        .split(|&c| is_wsp(c))
        .filter(|t| !t.is_empty());

    let parsed = (|| {
        let response_num = leading_u32(tokens.next()?)?;
        let cseq_num = leading_u32(tokens.next()?)?;
        let method = Method::from_bytes(tokens.next()?);
        Some(RAckValue {
            response_num,
            cseq_num,
            method,
        })
    })();

    if parsed.is_none() {
        warnings.push(Warning::new(WarningKind::MalformedRAck, start..end));
    }
    parsed
}
