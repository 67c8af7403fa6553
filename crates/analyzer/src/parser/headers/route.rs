use crate::error::{Warning, WarningKind};
use crate::parser::uri::parse_name_addr_or_addr_spec;
use crate::parser::utils::{find_any_unquoted, skip_wsp};
use crate::types::UriOffsets;

/// Route, Record-Route, Service-Route and Path: a comma separated list of
/// `name-addr` / `addr-spec`, each optionally followed by parameters.
pub fn parse_uri_list(buf: &[u8], start: usize, end: usize, warnings: &mut Vec<Warning>) -> Vec<UriOffsets> {
    let mut uris = Vec::new();
    let mut current = start;
    while skip_wsp(buf, current, end) < end {
        let uri = match parse_name_addr_or_addr_spec(buf, current, end) {
            Some(uri) => uri,
            None => {
                warnings.push(Warning::new(WarningKind::MalformedUri, current..end));
                break;
            }
        };
        let after = uri.name_addr.as_ref().map_or(end, |r| r.end);
        uris.push(uri);
        match find_any_unquoted(buf, after, end, b",") {
            Some((comma, _)) => current = comma + 1,
            None => break,
        }
    }
    uris
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_route_list() {
        let buf = b"<sip:server10.biloxi.com;lr>, <sip:bigbox3.site3.atlanta.com;lr>";
        let mut warnings = Vec::new();
        let uris = parse_uri_list(buf, 0, buf.len(), &mut warnings);
        assert_eq!(uris.len(), 2);
        assert_eq!(UriOffsets::text(buf, &uris[0].host), Some("server10.biloxi.com"));
        assert_eq!(UriOffsets::text(buf, &uris[1].parameters), Some("lr"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_route_with_header_params() {
        let buf = b"<sip:p1.example.com;lr>;foo=bar,<sip:p2.example.com>";
        let mut warnings = Vec::new();
        let uris = parse_uri_list(buf, 0, buf.len(), &mut warnings);
        assert_eq!(uris.len(), 2);
        assert_eq!(UriOffsets::text(buf, &uris[1].host), Some("p2.example.com"));
    }

    #[test]
    fn test_bad_entry_stops_list() {
        let buf = b"<sip:p1.example.com>, <p2";
        let mut warnings = Vec::new();
        let uris = parse_uri_list(buf, 0, buf.len(), &mut warnings);
        assert_eq!(uris.len(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
