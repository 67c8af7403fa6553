use crate::error::{Warning, WarningKind};
use crate::parser::utils::{exact_u32, find_any, find_any_unquoted, skip_wsp, text, trim_wsp_end};
use crate::types::{SecurityMechanism, SecurityParam, SecurityParamName};

/// Security-Client  =  "Security-Client" HCOLON sec-mechanism *(COMMA sec-mechanism)
/// sec-mechanism    =  mechanism-name *( SEMI mech-parameters )
///
/// Numeric parameters (`spi-c`, `port-s`, ...) without a value are reported
/// and parsing carries on with the next parameter.
pub fn parse_security_mechanisms(
    buf: &[u8],
    start: usize,
    end: usize,
    warnings: &mut Vec<Warning>,
) -> Vec<SecurityMechanism> {
    let end = end.min(buf.len());
    let mut mechanisms = Vec::new();
    let mut current = start;

    loop {
        current = skip_wsp(buf, current, end);
        if current >= end {
            break;
        }
        let delimiter = find_any(buf, current, end, b";,");
        let mechanism_end = trim_wsp_end(buf, current, delimiter.map_or(end, |(p, _)| p));
        let mut mechanism = SecurityMechanism {
            mechanism: current..mechanism_end,
            params: Vec::new(),
        };

        let mut next = delimiter;
        while let Some((pos, b';')) = next {
            let param_start = skip_wsp(buf, pos + 1, end);
            next = find_any_unquoted(buf, param_start, end, b";,");
            let param_end = trim_wsp_end(buf, param_start, next.map_or(end, |(p, _)| p));
            mechanism.params.push(parse_param(buf, param_start, param_end, warnings));
        }
        mechanisms.push(mechanism);

        match next {
            Some((pos, _)) => current = pos + 1,
            None => break,
        }
    }

    mechanisms
}

fn parse_param(buf: &[u8], start: usize, end: usize, warnings: &mut Vec<Warning>) -> SecurityParam {
    let equals = buf[start..end].iter().position(|&c| c == b'=').map(|i| start + i);
    let name_end = trim_wsp_end(buf, start, equals.unwrap_or(end));
    let name = SecurityParamName::from_name(&text(buf, start..name_end));
    let value = equals.map(|eq| skip_wsp(buf, eq + 1, end)..end);

    let number = match (name, &value) {
        (Some(param), Some(value)) if param.is_numeric() => exact_u32(&buf[value.clone()]),
        (Some(param), None) if param.is_numeric() => {
            warnings.push(Warning::new(WarningKind::MalformedSecurityParameter, start..end));
            None
        }
        _ => None,
    };

    SecurityParam {
        name,
        span: start..end,
        value,
        number,
    }
}
