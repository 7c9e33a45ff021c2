//! # mailforge-mime
//!
//! MIME part tree and wire serialization for composing email.
//!
//! ## Features
//!
//! - **Part tree**: Leaf parts and `multipart/alternative` / `multipart/mixed`
//!   composites
//! - **Headers**: Ordered, single-valued, case-insensitive header sets
//! - **Encoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//! - **Content types**: Parsing and always-quoted parameter output
//!
//! This crate only writes messages; it has no parser for received mail.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailforge_mime::{ContentType, Headers, MultipartKind, Part, Payload};
//!
//! let mut text_headers = Headers::new();
//! text_headers.set("Content-Type", ContentType::text_plain().to_string());
//! let text = Part::leaf(text_headers, Payload::Text("Hello".into()));
//!
//! let mut html_headers = Headers::new();
//! html_headers.set("Content-Type", ContentType::text_html().to_string());
//! let html = Part::leaf(html_headers, Payload::Text("<p>Hello</p>".into()));
//!
//! let message = Part::multipart(MultipartKind::Alternative, "b1", vec![text, html]);
//! println!("{message}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, canonical_name, split_address_list};
pub use message::{Body, MultipartKind, Part, Payload, TransferEncoding};
