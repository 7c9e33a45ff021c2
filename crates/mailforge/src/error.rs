//! Error types for composing and sending messages.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::DeliveryError;

/// Errors that can occur while composing or sending a message.
#[derive(Debug, Error)]
pub enum Error {
    /// A mutator was called with input that violates its contract.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Attachment file missing or unreadable.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Unknown construction key or unresolvable transport.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport failed to deliver the message.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl Error {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// MIME-level errors only arise from caller-supplied names, values and
// content types.
impl From<mailforge_mime::Error> for Error {
    fn from(err: mailforge_mime::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
