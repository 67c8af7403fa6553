use crate::parser::utils::{find_byte, skip_wsp, starts_with_ignore_case, trim_wsp_end};
use crate::types::AccessNetworkInfo;

/// P-Access-Network-Info  = "P-Access-Network-Info" HCOLON access-net-spec
/// access-net-spec        = (access-type / access-class) *(SEMI access-info)
pub fn parse_access_network_info(buf: &[u8], start: usize, end: usize) -> Option<AccessNetworkInfo> {
    let end = end.min(buf.len());
    let type_start = skip_wsp(buf, start, end);
    if type_start >= end {
        return None;
    }
    let semi = find_byte(buf, type_start, end, b';');
    let mut info = AccessNetworkInfo {
        access_type: type_start..trim_wsp_end(buf, type_start, semi.unwrap_or(end)),
        utran_cell_id: None,
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
        if starts_with_ignore_case(buf, param_start, b"utran-cell-id-3gpp=") {
            info.utran_cell_id = Some(param_start + 19..param_end);
        } else {
            info.params.push(param_start..param_end);
        }
    }

    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utran_cell_id() {
        let buf = b"3GPP-UTRAN-TDD; utran-cell-id-3gpp=23456789ABCDE; \"network-provided\"";
        let info = parse_access_network_info(buf, 0, buf.len()).unwrap();
        assert_eq!(&buf[info.access_type.clone()], b"3GPP-UTRAN-TDD");
        assert_eq!(&buf[info.utran_cell_id.clone().unwrap()], b"23456789ABCDE");
        assert_eq!(info.params.len(), 1);
    }

    #[test]
    fn test_access_type_only() {
        let buf = b" IEEE-802.11b ";
        let info = parse_access_network_info(buf, 0, buf.len()).unwrap();
        assert_eq!(&buf[info.access_type.clone()], b"IEEE-802.11b");
        assert!(info.utran_cell_id.is_none());
        assert!(parse_access_network_info(b"   ", 0, 3).is_none());
    }
}
