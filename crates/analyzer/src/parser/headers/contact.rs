use crate::error::{Warning, WarningKind};
use crate::parser::uri::parse_name_addr_or_addr_spec;
use crate::parser::utils::{find_any_unquoted, leading_u32, skip_wsp, starts_with_ignore_case, trim_wsp_end};
use crate::types::{ContactEntry, ContactList, UriOffsets};
use std::ops::Range;

/// Contact        =  ("Contact" / "m" ) HCOLON
///                   ( STAR / (contact-param *(COMMA contact-param)))
/// contact-param  =  (name-addr / addr-spec) *(SEMI contact-params)
pub fn parse_contact(buf: &[u8], start: usize, end: usize, warnings: &mut Vec<Warning>) -> ContactList {
    let end = end.min(buf.len());
    let first = skip_wsp(buf, start, end);
    if buf.get(first) == Some(&b'*') && trim_wsp_end(buf, first, end) == first + 1 {
        return ContactList {
            star: true,
            contacts: Vec::new(),
        };
    }

    let mut list = ContactList::default();
    let mut current = start;
    while skip_wsp(buf, current, end) < end {
        let uri = match parse_name_addr_or_addr_spec(buf, current, end) {
            Some(uri) => uri,
            None => {
                warnings.push(Warning::new(WarningKind::MalformedUri, current..end));
                break;
            }
        };
        let (entry, next) = contact_params(buf, uri, end);
        list.contacts.push(entry);
        match next {
            Some(next) => current = next,
            None => break,
        }
    }
    list
}

/// Parse the `;` parameters after one contact URI. Returns the entry and
/// the start of the next contact-param, if a comma follows.
fn contact_params(buf: &[u8], uri: UriOffsets, end: usize) -> (ContactEntry, Option<usize>) {
    let after_uri = uri.name_addr.as_ref().map_or(end, |r| r.end);
    let mut params: Vec<Range<usize>> = Vec::new();
    let mut expires = None;
    let mut next = None;

    let mut delimiter = find_any_unquoted(buf, after_uri, end, b",;");
    while let Some((pos, c)) = delimiter {
        if c == b',' {
            next = Some(pos + 1);
            break;
        }
        let param_start = skip_wsp(buf, pos + 1, end);
        delimiter = find_any_unquoted(buf, param_start, end, b",;");
        let param_end = trim_wsp_end(buf, param_start, delimiter.map_or(end, |(p, _)| p));
        if starts_with_ignore_case(buf, param_start, b"expires=") {
            expires = leading_u32(&buf[param_start + 8..param_end.max(param_start + 8)]);
        }
        params.push(param_start..param_end);
    }

    (ContactEntry { uri, params, expires }, next)
}
