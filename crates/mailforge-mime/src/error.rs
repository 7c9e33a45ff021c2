//! Errors raised while constructing parts.

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Input that cannot be written into a MIME part.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Header name or value would produce a malformed header line.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Unparseable `Content-Type` value.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
}
