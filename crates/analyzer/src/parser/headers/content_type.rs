use crate::parser::utils::{find_byte, skip_wsp, text, trim_wsp_end};
use crate::types::ContentTypeValue;

/// Content-Type  =  ( "Content-Type" / "c" ) HCOLON media-type
/// media-type    =  m-type SLASH m-subtype *(SEMI m-parameter)
pub fn parse_content_type(buf: &[u8], start: usize, end: usize) -> Option<ContentTypeValue> {
    let end = end.min(buf.len());
    let type_start = skip_wsp(buf, start, end);
    let semi = find_byte(buf, type_start, end, b';');
    let type_end = trim_wsp_end(buf, type_start, semi.unwrap_or(end));
    if type_end <= type_start {
        return None;
    }

    let media_type: String = text(buf, type_start..type_end)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let parameters = semi
        .map(|pos| skip_wsp(buf, pos + 1, end)..trim_wsp_end(buf, pos + 1, end))
        .filter(|r| !r.is_empty());

    Some(ContentTypeValue {
        media_type,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_is_lowercased() {
        let buf = b"Application/SDP";
        let value = parse_content_type(buf, 0, buf.len()).unwrap();
        assert_eq!(value.media_type, "application/sdp");
        assert!(value.parameters.is_none());
    }

    #[test]
    fn test_parameters_follow_first_semicolon() {
        let buf = b"multipart/mixed ; boundary=unique-boundary-1;charset=utf-8";
        let value = parse_content_type(buf, 0, buf.len()).unwrap();
        assert_eq!(value.media_type, "multipart/mixed");
        assert_eq!(
            &buf[value.parameters.unwrap()],
            b"boundary=unique-boundary-1;charset=utf-8"
        );
    }
}
