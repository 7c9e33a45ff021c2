//! `Content-Type` values.

use crate::encoding::{encode_parameter, percent_decode};
use crate::error::{Error, Result};
use crate::message::MultipartKind;
use std::fmt;

/// A `type/subtype` pair plus ordered parameters.
///
/// Parameter names are stored lowercased. ASCII values are always written
/// quoted; other values use RFC 2231 extended notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Top-level media type, lowercase.
    pub main_type: String,
    /// Media subtype, lowercase.
    pub sub_type: String,
    /// `(name, value)` pairs in the order they are written.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// `text/plain; charset="utf-8"`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// `text/html; charset="utf-8"`.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// `multipart/<kind>; boundary="<boundary>"`.
    #[must_use]
    pub fn multipart(kind: MultipartKind, boundary: impl Into<String>) -> Self {
        Self::new("multipart", kind.subtype()).with_parameter("boundary", boundary)
    }

    /// Builder form of [`set_parameter`](Self::set_parameter).
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(name, value);
        self
    }

    /// Stores a parameter. An existing parameter of the same name keeps its
    /// position and gets the new value.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        if let Some(slot) = self.parameters.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.parameters.push((name, value));
        }
    }

    /// Looks up a parameter by name, ignoring case.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find_map(|(n, v)| n.eq_ignore_ascii_case(name).then_some(v.as_str()))
    }

    /// The `charset` parameter.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// The `boundary` parameter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// True for `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// True for `text/*`.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type == "text"
    }

    /// Reads `type/subtype; name=value; name="value"`.
    ///
    /// Type and subtype are lowercased. Quoted values may contain `;` and
    /// backslash escapes. RFC 2231 extended and continued parameters
    /// (`name*=utf-8''...`, `name*0*=...`) are decoded into a single `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the type or subtype is
    /// missing or not a token, a parameter has no `=`, or a quoted value is
    /// not terminated.
    pub fn parse(s: &str) -> Result<Self> {
        let (essence, mut rest) = s.split_once(';').unwrap_or((s, ""));

        let Some((main_type, sub_type)) = essence.trim().split_once('/') else {
            return Err(Error::InvalidContentType(format!("Missing subtype in {s:?}")));
        };
        let main_type = main_type.trim().to_ascii_lowercase();
        let sub_type = sub_type.trim().to_ascii_lowercase();
        if !is_token(&main_type) || !is_token(&sub_type) {
            return Err(Error::InvalidContentType(format!(
                "Malformed type/subtype in {s:?}"
            )));
        }

        let mut parsed = Self::new(main_type, sub_type);
        let mut extended: Vec<(String, Vec<u8>)> = Vec::new();

        loop {
            rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }

            let Some(eq) = rest.find(['=', ';']).filter(|&i| rest[i..].starts_with('=')) else {
                return Err(Error::InvalidContentType(format!(
                    "Parameter without value in {s:?}"
                )));
            };
            let name = rest[..eq].trim().to_ascii_lowercase();
            rest = rest[eq + 1..].trim_start();

            let value = if let Some(quoted) = rest.strip_prefix('"') {
                let (value, consumed) = read_quoted(quoted).ok_or_else(|| {
                    Error::InvalidContentType(format!("Unterminated quoted value in {s:?}"))
                })?;
                rest = &quoted[consumed..];
                value
            } else {
                let end = rest.find(';').unwrap_or(rest.len());
                let value = rest[..end].trim().to_string();
                rest = &rest[end..];
                value
            };

            match split_extended(&name) {
                Some((base, section, encoded)) => {
                    let bytes = match (encoded, section) {
                        (true, None | Some(0)) => {
                            // charset'language'text
                            let text = value.splitn(3, '\'').nth(2).unwrap_or(&value);
                            percent_decode(text)
                        }
                        (true, Some(_)) => percent_decode(&value),
                        (false, _) => value.into_bytes(),
                    };
                    match extended.iter_mut().find(|(n, _)| n == base) {
                        Some((_, acc)) => acc.extend(bytes),
                        None => extended.push((base.to_string(), bytes)),
                    }
                }
                None => parsed.set_parameter(name, value),
            }
        }

        for (name, bytes) in extended {
            parsed.set_parameter(name, String::from_utf8_lossy(&bytes));
        }

        Ok(parsed)
    }
}

/// Reads a quoted string body (after the opening quote). Returns the
/// unescaped value and the number of bytes consumed including the closing
/// quote.
fn read_quoted(input: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        match c {
            _ if escaped => {
                value.push(c);
                escaped = false;
            }
            '\\' => escaped = true,
            '"' => return Some((value, i + 1)),
            _ => value.push(c),
        }
    }
    None
}

/// Splits an RFC 2231 parameter name into `(base, section, encoded)`.
/// Returns `None` for plain names.
fn split_extended(name: &str) -> Option<(&str, Option<usize>, bool)> {
    let (stem, encoded) = match name.strip_suffix('*') {
        Some(stem) => (stem, true),
        None => (name, false),
    };
    match stem.rsplit_once('*') {
        Some((base, n)) => n.parse().ok().map(|section| (base, Some(section), encoded)),
        None if encoded => Some((stem, None, true)),
        None => None,
    }
}

/// RFC 2045 token: non-empty, printable, no tspecials.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b))
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.main_type)?;
        f.write_str("/")?;
        f.write_str(&self.sub_type)?;
        for (name, value) in &self.parameters {
            write!(f, "; {}", encode_parameter(name, value))?;
        }
        Ok(())
    }
}
