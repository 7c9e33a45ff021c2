//! Turns builder state into a MIME part tree.
//!
//! The shape is decided in two stages:
//!
//! ```text
//! text? html?  ──►  0 bodies: none
//!                   1 body:   the body leaf
//!                   2 bodies: multipart/alternative [text, html]
//!
//! [body?] ++ attachments  ──►  0 parts: headers-only empty message
//!                              1 part:  that part, top-level headers copied onto it
//!                              n parts: multipart/mixed carrying the top-level headers
//! ```

use mailforge_mime::{Headers, MultipartKind, Part};
use tracing::debug;

/// Hands out boundaries for the composites of one assembly run.
///
/// Numbering restarts for every run, so assembling the same state twice
/// yields identical boundaries.
#[derive(Debug)]
pub(crate) struct Boundaries<'a> {
    prefix: &'a str,
    issued: usize,
}

impl<'a> Boundaries<'a> {
    pub(crate) const fn new(prefix: &'a str) -> Self {
        Self { prefix, issued: 0 }
    }

    // "=_" never occurs in base64 or quoted-printable output.
    fn next_boundary(&mut self) -> String {
        self.issued += 1;
        format!("=_{}_{}", self.prefix, self.issued)
    }
}

/// Builds the part tree for a message.
pub(crate) fn assemble(
    headers: &Headers,
    text: Option<&Part>,
    html: Option<&Part>,
    attachments: &[Part],
    boundaries: &mut Boundaries<'_>,
) -> Part {
    let mut alternatives: Vec<Part> = [text, html].into_iter().flatten().cloned().collect();

    let body = if alternatives.len() > 1 {
        Some(Part::multipart(
            MultipartKind::Alternative,
            boundaries.next_boundary(),
            alternatives,
        ))
    } else {
        alternatives.pop()
    };

    let mut parts: Vec<Part> = body.into_iter().chain(attachments.iter().cloned()).collect();

    if parts.len() > 1 {
        debug!(parts = parts.len(), "Assembling multipart/mixed message");
        return Part::multipart_with_headers(
            headers.clone(),
            MultipartKind::Mixed,
            boundaries.next_boundary(),
            parts,
        );
    }

    match parts.pop() {
        Some(mut part) => {
            debug!(
                multipart = part.is_multipart(),
                "Promoting single part to top level"
            );
            for (name, value) in headers.iter() {
                part.headers_mut().set_if_absent(name, value);
            }
            part
        }
        None => {
            debug!("No body or attachments, assembling headers-only message");
            Part::empty(headers.clone())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailforge_mime::Payload;

    fn leaf(content_type: &str, body: &str) -> Part {
        let mut headers = Headers::new();
        headers.set("Content-Type", content_type);
        Part::leaf(headers, Payload::Text(body.to_string()))
    }

    fn top_headers() -> Headers {
        let mut headers = Headers::new();
        headers.set("To", "a@example.com");
        headers.set("Subject", "Hi");
        headers
    }

    fn run(text: Option<&Part>, html: Option<&Part>, attachments: &[Part]) -> Part {
        assemble(
            &top_headers(),
            text,
            html,
            attachments,
            &mut Boundaries::new("t"),
        )
    }

    #[test]
    fn test_nothing_set() {
        let part = run(None, None, &[]);
        assert!(!part.is_multipart());
        assert!(part.payload().unwrap().is_empty());
        assert_eq!(part.headers(), &top_headers());
    }

    #[test]
    fn test_text_only() {
        let text = leaf("text/plain", "hello");
        let part = run(Some(&text), None, &[]);
        assert!(!part.is_multipart());
        assert_eq!(part.headers().get("Content-Type"), Some("text/plain"));
        assert_eq!(part.headers().get("To"), Some("a@example.com"));
        assert_eq!(part.headers().get("Subject"), Some("Hi"));
    }

    #[test]
    fn test_html_only() {
        let html = leaf("text/html", "<p>hi</p>");
        let part = run(None, Some(&html), &[]);
        assert_eq!(part.headers().get("Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_text_and_html() {
        let text = leaf("text/plain", "hello");
        let html = leaf("text/html", "<p>hello</p>");
        let part = run(Some(&text), Some(&html), &[]);

        assert_eq!(part.multipart_kind(), Some(MultipartKind::Alternative));
        assert_eq!(part.parts().len(), 2);
        assert_eq!(part.parts()[0].headers().get("Content-Type"), Some("text/plain"));
        assert_eq!(part.parts()[1].headers().get("Content-Type"), Some("text/html"));
        // The alternative is promoted, so it carries the top-level headers.
        assert_eq!(part.headers().get("Subject"), Some("Hi"));
        assert_eq!(part.content_type().unwrap().boundary(), Some("=_t_1"));
    }

    #[test]
    fn test_text_html_and_attachment() {
        let text = leaf("text/plain", "hello");
        let html = leaf("text/html", "<p>hello</p>");
        let attachment = leaf("image/png", "png");
        let part = run(Some(&text), Some(&html), &[attachment]);

        assert_eq!(part.multipart_kind(), Some(MultipartKind::Mixed));
        assert_eq!(part.parts().len(), 2);
        assert_eq!(
            part.parts()[0].multipart_kind(),
            Some(MultipartKind::Alternative)
        );
        assert_eq!(part.parts()[0].parts().len(), 2);
        assert_eq!(part.parts()[1].headers().get("Content-Type"), Some("image/png"));
        assert_eq!(part.headers().get("To"), Some("a@example.com"));
        assert_eq!(part.content_type().unwrap().boundary(), Some("=_t_2"));
    }

    #[test]
    fn test_text_and_attachments_mixed_order() {
        let text = leaf("text/plain", "hello");
        let a = leaf("image/gif", "a");
        let b = leaf("application/pdf", "b");
        let part = run(Some(&text), None, &[a, b]);

        let types: Vec<_> = part
            .parts()
            .iter()
            .map(|p| p.headers().get("Content-Type").unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["text/plain", "image/gif", "application/pdf"]);
    }

    #[test]
    fn test_lone_attachment_is_promoted() {
        let attachment = leaf("text/plain; name=\"README\"", "read me");
        let part = run(None, None, &[attachment]);

        assert!(!part.is_multipart());
        assert_eq!(
            part.headers().get("Content-Type"),
            Some("text/plain; name=\"README\"")
        );
        assert_eq!(part.headers().get("Subject"), Some("Hi"));
    }

    #[test]
    fn test_header_transfer_does_not_clobber() {
        let mut headers = top_headers();
        headers.set("Content-Type", "application/x-bogus");
        let text = leaf("text/plain", "hello");
        let part = assemble(&headers, Some(&text), None, &[], &mut Boundaries::new("t"));
        assert_eq!(part.headers().get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_two_attachments_without_body() {
        let a = leaf("image/gif", "a");
        let b = leaf("image/png", "b");
        let part = run(None, None, &[a, b]);
        assert_eq!(part.multipart_kind(), Some(MultipartKind::Mixed));
        assert_eq!(part.parts().len(), 2);
    }

    #[test]
    fn test_assembly_is_repeatable() {
        let text = leaf("text/plain", "hello");
        let html = leaf("text/html", "<p>hello</p>");
        let attachment = leaf("image/png", "png");
        let first = run(Some(&text), Some(&html), std::slice::from_ref(&attachment));
        let second = run(Some(&text), Some(&html), std::slice::from_ref(&attachment));
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }
}
