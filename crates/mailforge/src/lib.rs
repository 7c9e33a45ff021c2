//! # mailforge
//!
//! Fluent builder for composing email messages and handing them to a
//! transport.
//!
//! This crate provides:
//! - [`MessageBuilder`] for headers, text and HTML bodies, and attachments
//! - Automatic `multipart/alternative` and `multipart/mixed` assembly
//! - Content-type detection for attachments
//! - Pluggable [`Transport`]s resolved through a [`TransportRegistry`]
//! - Construction from a key/value mapping ([`MessageBuilder::from_config`])
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mailforge::{MessageBuilder, PrintTransport};
//!
//! let sent = MessageBuilder::new()
//!     .from(["sender@example.com"])?
//!     .to(["recipient@example.com"])?
//!     .subject("Hello")?
//!     .text_body("Plain text")
//!     .html_body("<p>HTML</p>")
//!     .transport(Arc::new(PrintTransport::stdout()))
//!     .send(None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod assemble;
mod attributes;
mod builder;
mod config;
mod error;
mod sniff;
pub mod transport;

pub use attributes::{FileSource, PartAttributes};
pub use builder::MessageBuilder;
pub use config::CONFIG_KEYS;
pub use error::{Error, Result};
pub use sniff::{DEFAULT_CONTENT_TYPE, detect_content_type};
pub use transport::{
    DeliveryError, DevNullTransport, Envelope, MboxTransport, PrintTransport, TestTransport,
    Transport, TransportOptions, TransportRegistry,
};

pub use mailforge_mime as mime;
pub use mailforge_mime::{
    ContentType, Headers, MultipartKind, Part, Payload, TransferEncoding,
};
