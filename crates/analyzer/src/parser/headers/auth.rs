use crate::error::{Warning, WarningKind};
use crate::parser::utils::{find_any, find_byte, find_closing_quote, is_wsp, skip_wsp, text, trim_wsp_end};
use crate::types::{AuthParam, AuthParamName, AuthValue};

/// challenge / credentials  =  auth-scheme LWS auth-param *(COMMA auth-param)
/// Authentication-Info      =  ainfo *(COMMA ainfo)
///
/// `has_scheme` is false for Authentication-Info, whose value starts
/// directly with parameters. An item without `=` ends the list with a
/// warning.
pub fn parse_auth(
    buf: &[u8],
    start: usize,
    end: usize,
    has_scheme: bool,
    warnings: &mut Vec<Warning>,
) -> AuthValue {
    let end = end.min(buf.len());
    let mut value = AuthValue::default();
    let mut current = skip_wsp(buf, start, end);

    if has_scheme {
        let scheme_end = buf[current.min(end)..end]
            .iter()
            .position(|&c| is_wsp(c) || c == b'\r' || c == b'\n')
            .map_or(end, |i| current + i);
        if scheme_end > current {
            value.scheme = Some(current..scheme_end);
        }
        current = scheme_end;
    }

    loop {
        current = skip_separators(buf, current, end);
        if current >= end {
            break;
        }

        let item_end = find_byte(buf, current, end, b',').unwrap_or(end);
        let equals = match find_byte(buf, current, item_end, b'=') {
            Some(pos) => pos,
            None => {
                warnings.push(Warning::new(
                    WarningKind::MalformedAuthParameter,
                    current..trim_wsp_end(buf, current, item_end),
                ));
                break;
            }
        };

        let name_span = current..trim_wsp_end(buf, current, equals);
        let value_start = skip_wsp(buf, equals + 1, end);
        let value_end = if buf.get(value_start) == Some(&b'"') {
            find_closing_quote(buf, value_start, end).map_or(end, |quote| quote + 1)
        } else {
            let stop = find_any(buf, value_start, end, b",\r\n").map_or(end, |(pos, _)| pos);
            trim_wsp_end(buf, value_start, stop)
        };

        value.params.push(AuthParam {
            name: AuthParamName::from_name(&text(buf, name_span.clone())),
            name_span,
            value_span: value_start..value_end,
        });
        current = value_end;
    }

    value
}

/// Whitespace, commas and folding between auth parameters
fn skip_separators(buf: &[u8], from: usize, to: usize) -> usize {
    let mut current = from;
    while current < to && matches!(buf[current], b' ' | b'\t' | b',' | b'\r' | b'\n') {
        current += 1;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_text<'a>(buf: &'a [u8], value: &AuthValue, name: AuthParamName) -> &'a [u8] {
        let param = value.param(name).unwrap();
        &buf[param.value_span.clone()]
    }

    #[test]
    fn test_digest_credentials() {
        let buf = br#"Digest username="bob", realm="biloxi.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", uri="sip:bob@biloxi.com", response="245f23415f11432b3434341c022", algorithm=MD5, nc=00000001"#;
        let mut warnings = Vec::new();
        let value = parse_auth(buf, 0, buf.len(), true, &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(&buf[value.scheme.clone().unwrap()], b"Digest");
        assert_eq!(value.params.len(), 7);
        assert_eq!(value_text(buf, &value, AuthParamName::Username), br#""bob""#);
        assert_eq!(value_text(buf, &value, AuthParamName::Algorithm), b"MD5");
        assert_eq!(value_text(buf, &value, AuthParamName::Nc), b"00000001");
    }

    #[test]
    fn test_quoted_value_with_comma() {
        let buf = br#"Digest realm="a, b", qop="auth,auth-int", x-vendor=1"#;
        let mut warnings = Vec::new();
        let value = parse_auth(buf, 0, buf.len(), true, &mut warnings);
        assert_eq!(value.params.len(), 3);
        assert_eq!(value_text(buf, &value, AuthParamName::Qop), br#""auth,auth-int""#);
        assert!(value.params[2].name.is_none());
    }

    #[test]
    fn test_authentication_info_has_no_scheme() {
        let buf = br#"nextnonce="47364c23432d2e131a5fb210812c", rspauth="abc""#;
        let mut warnings = Vec::new();
        let value = parse_auth(buf, 0, buf.len(), false, &mut warnings);
        assert!(value.scheme.is_none());
        assert_eq!(value.params.len(), 2);
        assert!(value.param(AuthParamName::Nextnonce).is_some());
        assert!(value.param(AuthParamName::Rspauth).is_some());
    }

    #[test]
    fn test_item_without_equals_stops_with_warning() {
        let buf = br#"Digest realm="x", broken, nonce="y""#;
        let mut warnings = Vec::new();
        let value = parse_auth(buf, 0, buf.len(), true, &mut warnings);
        assert_eq!(value.params.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::MalformedAuthParameter);
        assert_eq!(&buf[warnings[0].span.clone()], b"broken");
    }
}
