use crate::error::{Warning, WarningKind};
use crate::parser::utils::exact_u32;

/// Content-Length, Max-Forwards, Max-Breadth, RSeq, Expires, Min-Expires
///
/// `None` with a warning when the value is not a plain decimal number.
pub fn parse_integer(buf: &[u8], start: usize, end: usize, warnings: &mut Vec<Warning>) -> Option<u32> {
    let end = end.min(buf.len());
    let value = exact_u32(&buf[start.min(end)..end]);
    if value.is_none() {
        warnings.push(Warning::new(WarningKind::MalformedInteger, start..end));
    }
    value
}
