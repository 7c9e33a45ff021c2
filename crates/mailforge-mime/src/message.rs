//! MIME part tree and its wire serialization.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable};
use crate::error::Result;
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Encodes a payload for the wire.
    ///
    /// `7bit` and `8bit` turn bare LF into CRLF; `binary` passes the bytes
    /// through untouched.
    #[must_use]
    pub fn encode(self, payload: &Payload) -> Vec<u8> {
        let bytes = payload.as_bytes();
        match self {
            Self::Base64 => encode_base64_wrapped(bytes).into_bytes(),
            Self::QuotedPrintable => encode_quoted_printable(bytes).into_bytes(),
            Self::SevenBit | Self::EightBit => {
                let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 32);
                for (i, &b) in bytes.iter().enumerate() {
                    if b == b'\n' && (i == 0 || bytes[i - 1] != b'\r') {
                        out.push(b'\r');
                    }
                    out.push(b);
                }
                out
            }
            Self::Binary => bytes.to_vec(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// The two kinds of composite part this library produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartKind {
    /// Children are interchangeable renderings of the same content.
    Alternative,
    /// Children are heterogeneous: a body followed by attachments.
    Mixed,
}

impl MultipartKind {
    /// The `multipart/` subtype name.
    #[must_use]
    pub const fn subtype(self) -> &'static str {
        match self {
            Self::Alternative => "alternative",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for MultipartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multipart/{}", self.subtype())
    }
}

/// Decoded content of a leaf part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the payload as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns true if the payload holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Body of a part: either content, or an ordered list of child parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Terminal part.
    Leaf(Payload),
    /// Composite part.
    Multipart {
        /// Composite kind, mirrored in the `Content-Type` header.
        kind: MultipartKind,
        /// Delimiter between children.
        boundary: String,
        /// Children in order.
        parts: Vec<Part>,
    },
}

/// MIME part: a header block plus a body.
///
/// A whole message is just the top-level part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    headers: Headers,
    body: Body,
}

impl Part {
    /// Creates a leaf part.
    #[must_use]
    pub const fn leaf(headers: Headers, payload: Payload) -> Self {
        Self {
            headers,
            body: Body::Leaf(payload),
        }
    }

    /// Creates a leaf part with an empty body.
    #[must_use]
    pub const fn empty(headers: Headers) -> Self {
        Self::leaf(headers, Payload::Text(String::new()))
    }

    /// Creates a composite part and sets its `Content-Type` header.
    #[must_use]
    pub fn multipart(kind: MultipartKind, boundary: impl Into<String>, parts: Vec<Self>) -> Self {
        Self::multipart_with_headers(Headers::new(), kind, boundary, parts)
    }

    /// Creates a composite part on top of an existing header set.
    ///
    /// Any `Content-Type` in `headers` is replaced by the multipart one.
    #[must_use]
    pub fn multipart_with_headers(
        mut headers: Headers,
        kind: MultipartKind,
        boundary: impl Into<String>,
        parts: Vec<Self>,
    ) -> Self {
        let boundary = boundary.into();
        headers.set(
            "Content-Type",
            ContentType::multipart(kind, boundary.as_str()).to_string(),
        );
        Self {
            headers,
            body: Body::Multipart {
                kind,
                boundary,
                parts,
            },
        }
    }

    /// Part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the part headers.
    pub const fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Part body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Checks if this is a composite part.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart { .. })
    }

    /// The composite kind, if this is a composite part.
    #[must_use]
    pub const fn multipart_kind(&self) -> Option<MultipartKind> {
        match &self.body {
            Body::Multipart { kind, .. } => Some(*kind),
            Body::Leaf(_) => None,
        }
    }

    /// Child parts (empty for leaf parts).
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match &self.body {
            Body::Multipart { parts, .. } => parts,
            Body::Leaf(_) => &[],
        }
    }

    /// Leaf payload (`None` for composite parts).
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        match &self.body {
            Body::Leaf(payload) => Some(payload),
            Body::Multipart { .. } => None,
        }
    }

    /// Serializes the part to wire format bytes.
    ///
    /// Payload bytes are written exactly as their transfer encoding
    /// produces them, so `binary` content survives unchanged.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");

        match &self.body {
            Body::Leaf(payload) => {
                if !payload.is_empty() {
                    out.extend(self.transfer_encoding().encode(payload));
                    out.extend_from_slice(b"\r\n");
                }
            }
            Body::Multipart {
                boundary, parts, ..
            } => {
                for part in parts {
                    out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                    part.write_to(out);
                }
                out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
            }
        }
    }
}

/// Text rendering of [`Part::to_bytes`]. Bytes that are not UTF-8 (only
/// possible under `binary`) show as U+FFFD.
impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text_part(body: &str) -> Part {
        let mut headers = Headers::new();
        headers.set("content-type", ContentType::text_plain().to_string());
        headers.set("content-transfer-encoding", "quoted-printable");
        Part::leaf(headers, Payload::Text(body.to_string()))
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("nonsense"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_transfer_encoding_encode() {
        let payload = Payload::Text("a\nb".to_string());
        assert_eq!(TransferEncoding::SevenBit.encode(&payload), b"a\r\nb");
        assert_eq!(TransferEncoding::Base64.encode(&payload), b"YQpi");
        assert_eq!(TransferEncoding::QuotedPrintable.encode(&payload), b"a\r\nb");

        let crlf = Payload::Text("a\r\nb\n".to_string());
        assert_eq!(TransferEncoding::EightBit.encode(&crlf), b"a\r\nb\r\n");
    }

    #[test]
    fn test_binary_bytes_are_written_raw() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/octet-stream");
        headers.set("Content-Transfer-Encoding", "binary");
        let part = Part::leaf(headers, Payload::Binary(vec![0xFF, 0x00, 0x80, 0x41, b'\n']));

        let bytes = part.to_bytes();
        assert!(bytes.ends_with(&[b'\r', b'\n', 0xFF, 0x00, 0x80, 0x41, b'\n', b'\r', b'\n']));
    }

    #[test]
    fn test_leaf_accessors() {
        let part = text_part("Hello");
        assert!(!part.is_multipart());
        assert!(part.parts().is_empty());
        assert_eq!(part.payload(), Some(&Payload::Text("Hello".to_string())));
        assert_eq!(part.content_type().unwrap().mime_type(), "text/plain");
        assert_eq!(part.transfer_encoding(), TransferEncoding::QuotedPrintable);
    }

    #[test]
    fn test_leaf_display() {
        let part = text_part("Héllo");
        assert_eq!(
            part.to_string(),
            "Content-Type: text/plain; charset=\"utf-8\"\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             H=C3=A9llo\r\n"
        );
    }

    #[test]
    fn test_empty_display() {
        let mut headers = Headers::new();
        headers.set("Subject", "Nothing");
        let part = Part::empty(headers);
        assert_eq!(part.to_string(), "Subject: Nothing\r\n\r\n");
    }

    #[test]
    fn test_multipart_display() {
        let part = Part::multipart(
            MultipartKind::Alternative,
            "b1",
            vec![text_part("one"), text_part("two")],
        );

        assert_eq!(part.multipart_kind(), Some(MultipartKind::Alternative));
        assert_eq!(part.content_type().unwrap().boundary(), Some("b1"));

        let s = part.to_string();
        assert!(s.starts_with("Content-Type: multipart/alternative; boundary=\"b1\"\r\n\r\n--b1\r\n"));
        assert!(s.contains("\r\n\r\none\r\n--b1\r\n"));
        assert!(s.ends_with("\r\n\r\ntwo\r\n--b1--\r\n"));
    }

    #[test]
    fn test_multipart_with_headers_replaces_content_type() {
        let mut headers = Headers::new();
        headers.set("Subject", "Hi");
        headers.set("Content-Type", "text/plain");
        let part = Part::multipart_with_headers(
            headers,
            MultipartKind::Mixed,
            "b2",
            vec![text_part("one")],
        );

        let names: Vec<_> = part.headers().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Subject", "Content-Type"]);
        assert_eq!(
            part.headers().get("content-type"),
            Some("multipart/mixed; boundary=\"b2\"")
        );
    }

    #[test]
    fn test_nested_multipart_display() {
        let alt = Part::multipart(
            MultipartKind::Alternative,
            "inner",
            vec![text_part("one"), text_part("two")],
        );
        let mixed = Part::multipart(MultipartKind::Mixed, "outer", vec![alt, text_part("three")]);

        let s = mixed.to_string();
        assert_eq!(s.matches("--outer\r\n").count(), 2);
        assert_eq!(s.matches("--inner\r\n").count(), 2);
        assert!(s.contains("--inner--\r\n--outer\r\n"));
        assert!(s.ends_with("--outer--\r\n"));
    }

    #[test]
    fn test_binary_base64_display() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "image/png");
        headers.set("Content-Transfer-Encoding", "base64");
        let part = Part::leaf(headers, Payload::Binary(vec![0x89, b'P', b'N', b'G']));
        assert!(part.to_string().ends_with("\r\n\r\niVBORw==\r\n"));
        assert_eq!(part.to_bytes(), part.to_string().into_bytes());
    }
}
