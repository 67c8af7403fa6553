use crate::parser::uri::parse_name_addr_or_addr_spec;
use crate::parser::utils::{find_byte, find_ignore_case, trim_wsp_end};
use crate::types::AddressValue;

/// To / From / P-Asserted-Identity / P-Preferred-Identity
///
/// ```text
/// To        =  ( "To" / "t" ) HCOLON ( name-addr / addr-spec ) *( SEMI to-param )
/// ```
///
/// The `tag` parameter is searched after the end of the name-addr. Values
/// whose URI cannot be delimited (including non-SIP schemes) yield `None`.
pub fn parse_address(buf: &[u8], start: usize, end: usize) -> Option<AddressValue> {
    let uri = parse_name_addr_or_addr_spec(buf, start, end)?;

    let params_from = uri.name_addr.as_ref().map_or(start, |r| r.end);
    let tag = find_tag_param(buf, params_from, end).map(|tag_start| {
        let tag_end = find_byte(buf, tag_start, end, b';').unwrap_or(end);
        tag_start..trim_wsp_end(buf, tag_start, tag_end)
    });

    Some(AddressValue { uri, tag })
}

/// Start of the `tag` parameter value. Only a `tag=` that opens a
/// parameter counts, so `;epid-tag=x` is not a tag.
fn find_tag_param(buf: &[u8], from: usize, end: usize) -> Option<usize> {
    let mut at = from;
    while let Some(pos) = find_ignore_case(buf, at, end, b"tag=") {
        let before = buf[from..pos]
            .iter()
            .rposition(|&c| !matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
            .map(|i| buf[from + i]);
        if before == Some(b';') {
            return Some(pos + 4);
        }
        at = pos + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UriOffsets;

    #[test]
    fn test_from_with_tag() {
        let buf = b"Alice <sip:alice@atlanta.com>;tag=1928301774;x=y";
        let value = parse_address(buf, 0, buf.len()).unwrap();
        assert_eq!(UriOffsets::text(buf, &value.uri.user), Some("alice"));
        assert_eq!(&buf[value.tag.unwrap()], b"1928301774");
    }

    #[test]
    fn test_tag_inside_uri_is_ignored() {
        let buf = b"<sip:bob@biloxi.com;tag=fake>";
        let value = parse_address(buf, 0, buf.len()).unwrap();
        assert!(value.tag.is_none());
    }

    #[test]
    fn test_addr_spec_with_tag() {
        let buf = b"sip:bob@biloxi.com;tag=a6c85cf";
        let value = parse_address(buf, 0, buf.len()).unwrap();
        assert_eq!(&buf[value.tag.unwrap()], b"a6c85cf");
    }

    #[test]
    fn test_tag_must_open_a_parameter() {
        let buf = b"<sip:bob@biloxi.com>;epid-tag=x";
        assert!(parse_address(buf, 0, buf.len()).unwrap().tag.is_none());

        let buf = b"<sip:bob@biloxi.com>;epid-tag=x; tag=real";
        let value = parse_address(buf, 0, buf.len()).unwrap();
        assert_eq!(&buf[value.tag.unwrap()], b"real");
    }

    #[test]
    fn test_folded_value() {
        let buf = b"\r\n \"Alice\" <sip:alice@a.com>;tag=1";
        let value = parse_address(buf, 0, buf.len()).unwrap();
        assert_eq!(UriOffsets::text(buf, &value.uri.display_name), Some("Alice"));
        assert_eq!(&buf[value.tag.unwrap()], b"1");
    }

    #[test]
    fn test_non_sip_uri_is_not_rendered() {
        let buf = b"<tel:+15551234>";
        assert!(parse_address(buf, 0, buf.len()).is_none());
    }
}
