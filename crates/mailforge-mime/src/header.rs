//! MIME header handling.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of email headers.
///
/// Each name appears at most once. Names are stored in canonical casing
/// (`content-type` becomes `Content-Type`) and looked up case-insensitively.
/// Setting a name that already exists replaces its value in place, keeping
/// the original position in the header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header value, replacing any existing value.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = canonical_name(name.as_ref());
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Sets a header value only if the header is not present yet.
    ///
    /// Returns `true` if the value was stored.
    pub fn set_if_absent(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> bool {
        if self.contains(name.as_ref()) {
            return false;
        }
        self.set(name, value);
        true
    }

    /// Gets the value of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = canonical_name(name);
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = canonical_name(name);
        let idx = self.entries.iter().position(|(n, _)| *n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that a header name is a non-empty run of printable ASCII
    /// without colons (RFC 5322 field-name).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is not usable.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidHeader("Header name cannot be empty".into()));
        }
        if !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            return Err(Error::InvalidHeader(format!(
                "Header name contains invalid characters: {name:?}"
            )));
        }
        Ok(())
    }

    /// Checks that a header value is non-empty and cannot break out of its
    /// header line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the value is empty or contains
    /// CR or LF.
    pub fn validate_value(value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::InvalidHeader("Header value cannot be empty".into()));
        }
        if value.contains(['\r', '\n']) {
            return Err(Error::InvalidHeader(
                "Header value cannot contain line breaks".into(),
            ));
        }
        Ok(())
    }

    /// Wire form of a header value, before folding.
    ///
    /// ASCII values are written as they are. For non-ASCII values:
    ///
    /// - address fields (`From`, `To`, `Cc`, `Bcc`, `Reply-To`, `Sender`):
    ///   only display names become RFC 2047 words, `<addr-spec>` stays literal
    /// - `Content-*` fields: written unchanged; their parameters are already
    ///   RFC 2231 encoded by [`ContentType`](crate::ContentType)
    /// - everything else is unstructured text and becomes RFC 2047 words
    #[must_use]
    pub fn encode_value(name: &str, value: &str) -> String {
        if value.is_ascii() {
            return value.to_string();
        }

        let name = canonical_name(name);
        if ADDRESS_FIELDS.contains(&name.as_str()) {
            split_address_list(value)
                .into_iter()
                .map(encode_mailbox)
                .collect::<Vec<_>>()
                .join(", ")
        } else if name.starts_with("Content-") {
            value.to_string()
        } else {
            encode_rfc2047(value, "utf-8")
        }
    }
}

/// Fields whose value is a list of mailboxes.
const ADDRESS_FIELDS: [&str; 6] = ["From", "To", "Cc", "Bcc", "Reply-To", "Sender"];

/// Preferred maximum line length before folding (RFC 5322 section 2.1.1).
const FOLD_WIDTH: usize = 78;

/// Splits an address list on commas that are outside quoted strings and
/// angle brackets. Entries are trimmed; empty ones are dropped.
///
/// `"Doe, John" <j@example.com>, ann@example.com` yields two entries.
#[must_use]
pub fn split_address_list(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                entries.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(value[start..].trim());
    entries.retain(|entry| !entry.is_empty());
    entries
}

/// Encodes the display name of `Name <addr>`; the address stays literal.
fn encode_mailbox(mailbox: &str) -> String {
    let Some(open) = mailbox.rfind('<').filter(|_| mailbox.ends_with('>')) else {
        return mailbox.to_string();
    };
    let (phrase, addr) = (mailbox[..open].trim(), &mailbox[open..]);
    if phrase.is_empty() {
        return addr.to_string();
    }
    if phrase.is_ascii() {
        return format!("{phrase} {addr}");
    }
    format!("{} {addr}", encode_rfc2047(&unquote(phrase), "utf-8"))
}

/// Strips surrounding quotes and backslash escapes from a phrase.
fn unquote(phrase: &str) -> String {
    let Some(inner) = phrase.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return phrase.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}

/// Writes `Name: value` folded at spaces so lines stay within
/// [`FOLD_WIDTH`] where the value allows it.
fn write_folded(f: &mut fmt::Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    f.write_str(name)?;
    f.write_str(":")?;
    let mut line_len = name.len() + 1;
    for (i, word) in value.split(' ').enumerate() {
        if i > 0 && !word.is_empty() && line_len + 1 + word.len() > FOLD_WIDTH {
            f.write_str("\r\n")?;
            line_len = 0;
        }
        f.write_str(" ")?;
        f.write_str(word)?;
        line_len += 1 + word.len();
    }
    f.write_str("\r\n")
}

/// Normalizes a header name to its canonical casing.
///
/// Every `-`-separated word is capitalized and the rest lowercased, so
/// `content-TYPE` becomes `Content-Type`. `MIME-Version` and `Message-ID`
/// keep their conventional spelling.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.as_str() {
        "mime-version" => return "MIME-Version".to_string(),
        "message-id" => return "Message-ID".to_string(),
        _ => {}
    }

    lower
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write_folded(f, name, &Self::encode_value(name, value))?;
        }
        Ok(())
    }
}
