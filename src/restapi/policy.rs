//! Policy document handling
//!
//! Policies are JSON documents compared by structure, not by text. The
//! service hands them back escaped one level too deep, so reads undo exactly
//! one level of double-quoted string escaping.

use serde_json::Value;

/// Check that a policy is well-formed JSON
pub fn validate_json_string(policy: &str) -> Result<(), String> {
    serde_json::from_str::<Value>(policy)
        .map(|_| ())
        .map_err(|e| format!("contains an invalid JSON: {}", e))
}

/// Whether two policies are the same document
///
/// Key order and whitespace do not matter. An absent policy and an empty
/// one are equivalent; unparseable text only matches itself.
pub fn policies_equivalent(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.filter(|p| !p.trim().is_empty());
    let b = b.filter(|p| !p.trim().is_empty());

    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            match (
                serde_json::from_str::<Value>(a),
                serde_json::from_str::<Value>(b),
            ) {
                (Ok(a), Ok(b)) => a == b,
                _ => a == b,
            }
        },
        _ => false,
    }
}

/// Reverse one level of escaping on a policy returned by the service
///
/// `{\"Version\":\"2012-10-17\"}` becomes `{"Version":"2012-10-17"}`. The
/// input is treated as the inside of a double-quoted string literal, so a
/// bare `"`, a raw newline, or an unknown escape is an error.
pub fn unescape_policy(escaped: &str) -> Result<String, String> {
    let mut out: Vec<u8> = Vec::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => return Err("unescaped double quote".to_string()),
            '\n' => return Err("unescaped newline".to_string()),
            '\\' => {
                let Some(esc) = chars.next() else {
                    return Err("trailing backslash".to_string());
                };
                match esc {
                    'a' => out.push(0x07),
                    'b' => out.push(0x08),
                    'f' => out.push(0x0c),
                    'n' => out.push(b'\n'),
                    'r' => out.push(b'\r'),
                    't' => out.push(b'\t'),
                    'v' => out.push(0x0b),
                    '\\' => out.push(b'\\'),
                    '"' => out.push(b'"'),
                    'x' => {
                        let byte = take_hex(&mut chars, 2)?;
                        out.push(byte as u8);
                    },
                    'u' | 'U' => {
                        let digits = if esc == 'u' { 4 } else { 8 };
                        let code = take_hex(&mut chars, digits)?;
                        let ch = char::from_u32(code)
                            .ok_or_else(|| format!("invalid code point \\{}{:x}", esc, code))?;
                        push_char(&mut out, ch);
                    },
                    '0'..='7' => {
                        let mut value = esc.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            let digit = chars
                                .next()
                                .and_then(|d| d.to_digit(8))
                                .ok_or_else(|| "invalid octal escape".to_string())?;
                            value = value * 8 + digit;
                        }
                        if value > 0xff {
                            return Err(format!("octal escape out of range: {}", value));
                        }
                        out.push(value as u8);
                    },
                    other => return Err(format!("invalid escape sequence \\{}", other)),
                }
            },
            _ => push_char(&mut out, c),
        }
    }

    String::from_utf8(out).map_err(|_| "escape sequences produce invalid UTF-8".to_string())
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn take_hex(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
) -> Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|d| d.to_digit(16))
            .ok_or_else(|| "invalid hex escape".to_string())?;
        value = value * 16 + digit;
    }
    Ok(value)
}
