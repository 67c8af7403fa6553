// Byte scanning helpers shared by the line, URI and header parsers.
//
// Every helper takes an explicit `[from, to)` window. `to` is clamped to the
// buffer length, so no helper can read past the bytes it was handed.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{map_res, recognize},
    multi::many0,
    IResult,
};

// Type alias for parser result
pub type ParseResult<'a, O> = IResult<&'a [u8], O>;

/// Parses a single whitespace character (SP or HTAB)
pub fn wsp(input: &[u8]) -> ParseResult<&[u8]> {
    alt((tag(b" "), tag(b"\t")))(input)
}

/// Parses optional whitespace (0 or more SP or HTAB)
pub fn owsp(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(many0(wsp))(input)
}

/// Parses an unsigned 32 bit decimal number
pub fn uint32(input: &[u8]) -> ParseResult<u32> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u32>().map_err(|_| ()))
    })(input)
}

/// Leading decimal digits, like `strtoul`: `None` if there are no digits,
/// saturating on overflow.
pub fn leading_u32(input: &[u8]) -> Option<u32> {
    let digits = input.iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value = input[..digits].iter().fold(0u64, |acc, d| {
        (acc * 10 + u64::from(d - b'0')).min(u64::from(u32::MAX))
    });
    Some(value as u32)
}

/// Whole input is an unsigned decimal number, surrounding whitespace allowed
pub fn exact_u32(input: &[u8]) -> Option<u32> {
    let (rest, _) = owsp(input).ok()?;
    let (rest, value) = uint32(rest).ok()?;
    let (rest, _) = owsp(rest).ok()?;
    rest.is_empty().then_some(value)
}

#[inline]
pub fn is_wsp(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

#[inline]
fn window(buf: &[u8], from: usize, to: usize) -> (usize, usize) {
    let to = to.min(buf.len());
    (from.min(to), to)
}

/// Offset of the first `needle` in `buf[from..to]`
pub fn find_byte(buf: &[u8], from: usize, to: usize, needle: u8) -> Option<usize> {
    let (from, to) = window(buf, from, to);
    buf[from..to].iter().position(|&c| c == needle).map(|i| from + i)
}

/// Offset and value of the first byte of `set` in `buf[from..to]`
pub fn find_any(buf: &[u8], from: usize, to: usize, set: &[u8]) -> Option<(usize, u8)> {
    let (from, to) = window(buf, from, to);
    buf[from..to]
        .iter()
        .position(|c| set.contains(c))
        .map(|i| (from + i, buf[from + i]))
}

/// Offset of `pattern` in `buf[from..to]`, ASCII case-insensitive
pub fn find_ignore_case(buf: &[u8], from: usize, to: usize, pattern: &[u8]) -> Option<usize> {
    let (from, to) = window(buf, from, to);
    if pattern.is_empty() || to - from < pattern.len() {
        return None;
    }
    buf[from..to]
        .windows(pattern.len())
        .position(|w| w.eq_ignore_ascii_case(pattern))
        .map(|i| from + i)
}

/// Length of the line fold starting at `at`: CRLF or LF followed by SP/HTAB
fn fold_len(buf: &[u8], at: usize, to: usize) -> usize {
    match buf.get(at..to) {
        Some([b'\r', b'\n', c, ..]) if is_wsp(*c) => 2,
        Some([b'\n', c, ..]) if is_wsp(*c) => 1,
        _ => 0,
    }
}

/// First offset in `[from, to)` that is not LWS (SP, HTAB or a line fold),
/// or `to`
pub fn skip_wsp(buf: &[u8], from: usize, to: usize) -> usize {
    let (mut current, to) = window(buf, from, to);
    while current < to {
        if is_wsp(buf[current]) {
            current += 1;
        } else {
            match fold_len(buf, current, to) {
                0 => break,
                n => current += n,
            }
        }
    }
    current
}

/// End of `[from, to)` after dropping trailing LWS
pub fn trim_wsp_end(buf: &[u8], from: usize, to: usize) -> usize {
    let (from, to) = window(buf, from, to);
    buf[from..to]
        .iter()
        .rposition(|&c| !matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
        .map_or(from, |i| from + i + 1)
}

/// Whether `buf[at..]` starts with `pattern`, ASCII case-insensitive
pub fn starts_with_ignore_case(buf: &[u8], at: usize, pattern: &[u8]) -> bool {
    buf.get(at..at.saturating_add(pattern.len()))
        .map_or(false, |s| s.eq_ignore_ascii_case(pattern))
}

/// Offset of the closing `"` of a quoted string whose opening quote is at `open`.
///
/// A quote preceded by an odd number of backslashes is escaped.
pub fn find_closing_quote(buf: &[u8], open: usize, to: usize) -> Option<usize> {
    let mut at = open + 1;
    loop {
        let quote = find_byte(buf, at, to, b'"')?;
        let backslashes = buf[open + 1..quote]
            .iter()
            .rev()
            .take_while(|&&c| c == b'\\')
            .count();
        if backslashes % 2 == 0 {
            return Some(quote);
        }
        at = quote + 1;
    }
}

/// Like [`find_any`], skipping over quoted strings
pub fn find_any_unquoted(buf: &[u8], from: usize, to: usize, set: &[u8]) -> Option<(usize, u8)> {
    let mut at = from;
    loop {
        let (pos, c) = find_any(buf, at, to, &[set, &b"\""[..]].concat())?;
        if c == b'"' && !set.contains(&b'"') {
            at = find_closing_quote(buf, pos, to)? + 1;
            continue;
        }
        return Some((pos, c));
    }
}

/// Lossy UTF-8 text of `buf[range]`, empty if the range is out of bounds
pub fn text(buf: &[u8], range: std::ops::Range<usize>) -> String {
    buf.get(range)
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

/// Replaces line folding (line break followed by SP/HTAB) and runs of
/// whitespace with a single SP.
pub fn unfold_lws(input: &[u8]) -> Vec<u8> {
    let mut unfolded = Vec::with_capacity(input.len());
    let mut i = 0;
    let mut last_was_wsp = false;

    while i < input.len() {
        let fold_len = match &input[i..] {
            [b'\r', b'\n', c, ..] if is_wsp(*c) => 2,
            [b'\n', c, ..] if is_wsp(*c) => 1,
            [c, ..] if is_wsp(*c) => 0,
            _ => {
                unfolded.push(input[i]);
                i += 1;
                last_was_wsp = false;
                continue;
            }
        };
        i += fold_len;
        while i < input.len() && is_wsp(input[i]) {
            i += 1;
        }
        if !last_was_wsp {
            unfolded.push(b' ');
            last_was_wsp = true;
        }
    }

    unfolded
}
