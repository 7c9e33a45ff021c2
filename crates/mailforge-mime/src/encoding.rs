//! MIME encoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum line length for encoded bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF separated lines of at most
/// 76 characters.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is pure ASCII, so byte chunks are valid str boundaries.
    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        result.extend(chunk.iter().map(|&b| b as char));
    }

    result
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks (`\n` or `\r\n`) in the input are kept as hard CRLF breaks;
/// longer lines get soft breaks. Whitespace at the end of a line is escaped.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len());

    let mut lines = split_lines(data).peekable();
    while let Some(line) = lines.next() {
        encode_qp_line(line, &mut result);
        if lines.peek().is_some() {
            result.push_str("\r\n");
        }
    }

    result
}

/// Splits on `\n`, dropping a preceding `\r`.
fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn encode_qp_line(line: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, &byte) in line.iter().enumerate() {
        let is_last = i + 1 == line.len();
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !is_last,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Leave room for the trailing '=' of a soft break.
        if line_length + width > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            out.push(byte as char);
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += width;
    }
}

/// Longest encoded word RFC 2047 allows.
const MAX_ENCODED_WORD: usize = 75;

/// Encoded parameter text longer than this is split into RFC 2231
/// continuation sections.
const MAX_PARAMETER_SECTION: usize = 60;

/// Encodes header text using RFC 2047 `B` encoded words.
///
/// Plain ASCII is returned unchanged. Otherwise the text is split on
/// character boundaries into words of at most 75 characters, separated by
/// single spaces (which decoders drop between adjacent encoded words).
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    // "=?" + charset + "?B?" + payload + "?="
    let payload_chars = MAX_ENCODED_WORD.saturating_sub(charset.len() + 7);
    let chunk_bytes = (payload_chars / 4 * 3).max(4);

    let mut words = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + chunk_bytes).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            end = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        let encoded = encode_base64(&text.as_bytes()[start..end]);
        words.push(format!("=?{charset}?B?{encoded}?="));
        start = end;
    }

    words.join(" ")
}

/// Formats one MIME parameter for a `Content-Type` or
/// `Content-Disposition` value.
///
/// ASCII values become `name="value"` with `\` and `"` escaped. Other
/// values use RFC 2231 extended notation (`name*=utf-8''r%C3%A9sum%C3%A9`),
/// split into `name*0*`, `name*1*`, ... sections separated by `; ` when long.
#[must_use]
pub fn encode_parameter(name: &str, value: &str) -> String {
    if value.is_ascii() {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("{name}=\"{escaped}\"");
    }

    let mut sections: Vec<String> = vec![String::new()];
    for &byte in value.as_bytes() {
        let piece = if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            char::from(byte).to_string()
        } else {
            format!("%{byte:02X}")
        };
        if sections.last().is_some_and(|s| s.len() + piece.len() > MAX_PARAMETER_SECTION) {
            sections.push(String::new());
        }
        if let Some(section) = sections.last_mut() {
            section.push_str(&piece);
        }
    }

    if let [only] = sections.as_slice() {
        return format!("{name}*=utf-8''{only}");
    }
    sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            if i == 0 {
                format!("{name}*0*=utf-8''{section}")
            } else {
                format!("{name}*{i}*={section}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reverses `%XX` escapes; malformed escapes are kept literally.
pub(crate) fn percent_decode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(byte) = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
