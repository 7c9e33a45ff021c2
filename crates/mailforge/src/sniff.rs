//! Content type detection for attachments.

/// Returned when neither the filename nor the content gives a hint.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Known filename extensions, matched case-insensitively.
const EXTENSIONS: &[(&str, &str)] = &[
    ("gif", "image/gif"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("txt", "text/plain"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("pdf", "application/pdf"),
    ("wav", "audio/wav"),
];

/// Leading bytes of well-known formats.
const MAGIC: &[(&[u8], &str)] = &[
    (b"GIF8", "image/gif"),
    (b"\xFF\xD8", "image/jpeg"),
    (b"\x89PNG", "image/png"),
    (b"%PDF-", "application/pdf"),
];

/// Guesses the content type of an attachment.
///
/// The filename extension is consulted first; only when it is missing or
/// unknown are the leading bytes of `body` inspected. Never fails.
#[must_use]
pub fn detect_content_type(filename: Option<&str>, body: &[u8]) -> &'static str {
    filename
        .and_then(from_extension)
        .or_else(|| from_magic(body))
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, content_type)| *content_type)
}

fn from_magic(body: &[u8]) -> Option<&'static str> {
    MAGIC
        .iter()
        .find(|(magic, _)| body.starts_with(magic))
        .map(|(_, content_type)| *content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(detect_content_type(Some("photo.png"), b""), "image/png");
        assert_eq!(detect_content_type(Some("PHOTO.JPEG"), b""), "image/jpeg");
        assert_eq!(detect_content_type(Some("a.b.html"), b""), "text/html");
        assert_eq!(detect_content_type(Some("sound.wav"), b""), "audio/wav");
        assert_eq!(detect_content_type(Some("data.csv"), b""), "text/csv");
    }

    #[test]
    fn test_extension_wins_over_magic() {
        assert_eq!(detect_content_type(Some("photo.png"), b"%PDF-1.4"), "image/png");
    }

    #[test]
    fn test_unknown_extension_falls_back_to_magic() {
        assert_eq!(detect_content_type(Some("scan.bin"), b"%PDF-1.7"), "application/pdf");
        assert_eq!(detect_content_type(Some("README"), b"GIF89a"), "image/gif");
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(detect_content_type(None, b"GIF87a..."), "image/gif");
        assert_eq!(detect_content_type(None, b"\xFF\xD8\xFF\xE0"), "image/jpeg");
        assert_eq!(detect_content_type(None, b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(detect_content_type(None, b"%PDF-1.4"), "application/pdf");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(detect_content_type(None, b"hello"), DEFAULT_CONTENT_TYPE);
        assert_eq!(detect_content_type(None, b""), DEFAULT_CONTENT_TYPE);
        assert_eq!(detect_content_type(Some("noext"), b"\x00\x01"), DEFAULT_CONTENT_TYPE);
        // Too short to match any signature.
        assert_eq!(detect_content_type(None, b"%PDF"), DEFAULT_CONTENT_TYPE);
    }

    proptest! {
        #[test]
        fn prop_png_extension_always_wins(body in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(detect_content_type(Some("photo.png"), &body), "image/png");
        }

        #[test]
        fn prop_detect_is_deterministic(name in proptest::option::of("[a-z]{0,8}(\\.[a-zA-Z]{1,5})?"), body in proptest::collection::vec(any::<u8>(), 0..16)) {
            let first = detect_content_type(name.as_deref(), &body);
            prop_assert_eq!(first, detect_content_type(name.as_deref(), &body));
            prop_assert!(first.contains('/'));
        }
    }
}
