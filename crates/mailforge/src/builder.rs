//! Fluent message builder.

use std::sync::Arc;

use chrono::Utc;
use mailforge_mime::{ContentType, Headers, Part, Payload, TransferEncoding};
use tracing::{debug, info, warn};

use crate::assemble::{Boundaries, assemble};
use crate::attributes::{FileSource, PartAttributes};
use crate::error::{Error, Result};
use crate::sniff::detect_content_type;
use crate::transport::{Transport, TransportOptions, TransportRegistry};

/// Accumulates headers, bodies and attachments, and assembles them into a
/// MIME message on demand.
///
/// Every mutator consumes and returns the builder, so calls chain:
///
/// ```ignore
/// use mailforge::{MessageBuilder, PartAttributes};
///
/// let message = MessageBuilder::new()
///     .from(["sender@example.com"])?
///     .to(["a@example.com", "b@example.com"])?
///     .subject("Report")?
///     .text_body("See attached.")
///     .attach_file("report.pdf", &PartAttributes::new())?
///     .render();
/// ```
///
/// Validation happens in the mutator that receives bad input; [`build`]
/// never fails and recomputes the tree from the current state each time.
///
/// [`build`]: MessageBuilder::build
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    headers: Headers,
    text: Option<Part>,
    html: Option<Part>,
    attachments: Vec<Part>,
    transport: Option<Arc<dyn Transport>>,
    boundary_prefix: String,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    /// Creates a builder with `Date` and `MIME-Version` headers set.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        let mut headers = Headers::new();
        headers.set("Date", now.to_rfc2822());
        headers.set("MIME-Version", "1.0");

        Self {
            headers,
            text: None,
            html: None,
            attachments: Vec::new(),
            transport: None,
            boundary_prefix: format!("{:x}.{}", now.timestamp_micros(), std::process::id()),
        }
    }

    /// Sets a top-level header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name or value is empty, the name
    /// is not a valid field name, or the value contains a line break.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        Headers::validate_name(name)?;
        Headers::validate_value(&value)?;
        self.headers.set(name, value);
        Ok(self)
    }

    /// Sets the `To` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if no address is given or any entry is
    /// empty.
    pub fn to<I, S>(self, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_addresses("To", addresses)
    }

    /// Sets the `From` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] unless exactly one valid address is
    /// given.
    pub fn from<I, S>(self, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.single_address("From", addresses)
    }

    /// Sets the `Cc` header. An empty list removes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any entry is empty.
    pub fn cc<I, S>(self, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.optional_addresses("Cc", addresses)
    }

    /// Sets the `Bcc` header. An empty list removes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any entry is empty.
    pub fn bcc<I, S>(self, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.optional_addresses("Bcc", addresses)
    }

    /// Sets the `Reply-To` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] unless exactly one valid address is
    /// given.
    pub fn reply_to<I, S>(self, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.single_address("Reply-To", addresses)
    }

    /// Sets the `Subject` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the subject contains a line break.
    pub fn subject(mut self, subject: impl Into<String>) -> Result<Self> {
        let subject = subject.into();
        if subject.contains(['\r', '\n']) {
            return Err(Error::validation("Subject cannot contain line breaks"));
        }
        self.headers.set("Subject", subject);
        Ok(self)
    }

    /// Sets the plain text body (`text/plain; charset="utf-8"`,
    /// quoted-printable).
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text = Some(Self::body_part(body.into(), ContentType::text_plain()));
        self
    }

    /// Sets the plain text body with attribute overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the attributes are malformed.
    pub fn text_body_with(mut self, body: impl Into<String>, attrs: &PartAttributes) -> Result<Self> {
        self.text = Some(Self::try_body_part(body.into(), ContentType::text_plain(), attrs)?);
        Ok(self)
    }

    /// Sets the HTML body (`text/html; charset="utf-8"`, quoted-printable).
    #[must_use]
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html = Some(Self::body_part(body.into(), ContentType::text_html()));
        self
    }

    /// Sets the HTML body with attribute overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the attributes are malformed.
    pub fn html_body_with(mut self, body: impl Into<String>, attrs: &PartAttributes) -> Result<Self> {
        self.html = Some(Self::try_body_part(body.into(), ContentType::text_html(), attrs)?);
        Ok(self)
    }

    /// Appends an attachment.
    ///
    /// Defaults: base64, `attachment` disposition, and a content type
    /// detected from `attrs.filename` and the data when `attrs` does not
    /// give one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the attributes are malformed.
    pub fn attach(mut self, data: impl Into<Vec<u8>>, attrs: &PartAttributes) -> Result<Self> {
        let data = data.into();
        let detected = detect_content_type(attrs.filename.as_deref(), &data);
        let (main_type, sub_type) = detected
            .split_once('/')
            .unwrap_or(("application", "octet-stream"));

        let size = data.len();
        let part = attrs.build_part(
            Payload::Binary(data),
            ContentType::new(main_type, sub_type),
            TransferEncoding::Base64,
            Some("attachment"),
        )?;

        debug!(
            content_type = part.headers().get("Content-Type").unwrap_or_default(),
            size, "Attachment added"
        );
        self.attachments.push(part);
        Ok(self)
    }

    /// Reads a file (or takes in-memory content) and attaches it.
    ///
    /// The base file name becomes both the `name` and the `filename`
    /// attribute unless `attrs` sets them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::Validation`] if the attributes are malformed.
    pub fn attach_file(self, source: impl Into<FileSource>, attrs: &PartAttributes) -> Result<Self> {
        let (data, basename) = source.into().load()?;

        let mut attrs = attrs.clone();
        attrs.name.get_or_insert_with(|| basename.clone());
        attrs.filename.get_or_insert(basename);

        self.attach(data, &attrs)
    }

    /// Uses the given transport for [`send`](Self::send).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolves a transport moniker through `registry` and uses it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the moniker is unknown or its options
    /// are rejected.
    pub fn transport_named(
        mut self,
        name: &str,
        options: &TransportOptions,
        registry: &TransportRegistry,
    ) -> Result<Self> {
        self.transport = Some(registry.resolve(name, options)?);
        Ok(self)
    }

    /// Overrides the prefix used for multipart boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the prefix is empty, longer than 60
    /// characters, or contains characters not allowed in a boundary.
    pub fn boundary_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let allowed = |c: char| c.is_ascii_alphanumeric() || "'()+_,-./:=?".contains(c);
        if prefix.is_empty() || prefix.len() > 60 || !prefix.chars().all(allowed) {
            return Err(Error::validation(format!("Invalid boundary prefix: {prefix:?}")));
        }
        self.boundary_prefix = prefix;
        Ok(self)
    }

    /// Top-level headers as set so far.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Number of attachments added so far.
    #[must_use]
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// Returns true if a transport is configured.
    #[must_use]
    pub const fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Assembles the message tree from the current state.
    #[must_use]
    pub fn build(&self) -> Part {
        assemble(
            &self.headers,
            self.text.as_ref(),
            self.html.as_ref(),
            &self.attachments,
            &mut Boundaries::new(&self.boundary_prefix),
        )
    }

    /// Assembles the message and serializes it to wire format.
    #[must_use]
    pub fn render(&self) -> String {
        self.build().to_string()
    }

    /// Builds and sends the message through the configured transport.
    ///
    /// Returns `false` if no transport is configured or delivery fails.
    pub fn send(&self, options: Option<&TransportOptions>) -> bool {
        let Some(transport) = &self.transport else {
            warn!("No transport configured, message not sent");
            return false;
        };
        let sent = transport.try_send(&self.build(), options.unwrap_or(&TransportOptions::new()));
        if sent {
            info!(transport = ?transport, "Message sent");
        }
        sent
    }

    /// Builds and sends the message, propagating delivery failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no transport is configured and
    /// [`Error::Delivery`] if the transport fails.
    pub fn send_or_die(&self, options: Option<&TransportOptions>) -> Result<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| Error::config("No transport configured"))?;
        transport.send(&self.build(), options.unwrap_or(&TransportOptions::new()))?;
        info!(transport = ?transport, "Message sent");
        Ok(())
    }

    fn body_part(body: String, content_type: ContentType) -> Part {
        let mut headers = Headers::new();
        headers.set("Content-Type", content_type.to_string());
        headers.set(
            "Content-Transfer-Encoding",
            TransferEncoding::QuotedPrintable.to_string(),
        );
        Part::leaf(headers, Payload::Text(body))
    }

    fn try_body_part(body: String, default_type: ContentType, attrs: &PartAttributes) -> Result<Part> {
        let mut content_type = match &attrs.content_type {
            Some(ct) => ContentType::parse(ct)?,
            None => default_type,
        };
        if content_type.is_text() && content_type.charset().is_none() {
            content_type.set_parameter("charset", "utf-8");
        }

        let attrs = PartAttributes {
            content_type: None,
            ..attrs.clone()
        };
        attrs.build_part(
            Payload::Text(body),
            content_type,
            TransferEncoding::QuotedPrintable,
            None,
        )
    }

    fn required_addresses<I, S>(mut self, field: &str, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = address_list(field, addresses)?;
        if list.is_empty() {
            return Err(Error::validation(format!("{field} requires at least one address")));
        }
        self.headers.set(field, list.join(", "));
        Ok(self)
    }

    fn single_address<I, S>(mut self, field: &str, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = address_list(field, addresses)?;
        if list.len() != 1 {
            return Err(Error::validation(format!(
                "{field} takes exactly one address, got {}",
                list.len()
            )));
        }
        self.headers.set(field, list.join(", "));
        Ok(self)
    }

    fn optional_addresses<I, S>(mut self, field: &str, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = address_list(field, addresses)?;
        if list.is_empty() {
            self.headers.remove(field);
        } else {
            self.headers.set(field, list.join(", "));
        }
        Ok(self)
    }
}

/// Collects and checks address entries.
fn address_list<I, S>(field: &str, addresses: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    addresses
        .into_iter()
        .map(|addr| {
            let addr = addr.as_ref().trim();
            if addr.is_empty() {
                return Err(Error::validation(format!("{field} contains an empty address")));
            }
            if addr.contains(['\r', '\n']) {
                return Err(Error::validation(format!(
                    "{field} address contains a line break"
                )));
            }
            Ok(addr.to_string())
        })
        .collect()
}
