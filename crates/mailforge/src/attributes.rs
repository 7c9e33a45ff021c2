//! Per-part attributes and attachment sources.

use std::path::{Path, PathBuf};

use mailforge_mime::encoding::encode_parameter;
use mailforge_mime::{ContentType, Headers, Part, Payload, TransferEncoding};

use crate::error::{Error, Result};

/// Optional overrides applied when a body or attachment part is created.
///
/// Anything left as `None` falls back to the default of the operation the
/// attributes are passed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartAttributes {
    /// Full content type, e.g. `text/plain` or `image/png; foo=bar`.
    pub content_type: Option<String>,
    /// `charset` parameter of the content type.
    ///
    /// Only the label changes; text is always stored and written as UTF-8,
    /// so a different charset only fits content that is already in it.
    pub charset: Option<String>,
    /// Transfer encoding.
    pub encoding: Option<TransferEncoding>,
    /// `name` parameter of the content type.
    pub name: Option<String>,
    /// `filename` parameter of the content disposition.
    pub filename: Option<String>,
    /// Disposition, e.g. `attachment` or `inline`.
    pub disposition: Option<String>,
}

impl PartAttributes {
    /// Creates empty attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the charset label. The content is not transcoded.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the transfer encoding.
    #[must_use]
    pub const fn encoding(mut self, encoding: TransferEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Sets the `name` parameter.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the `filename` parameter.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the disposition.
    #[must_use]
    pub fn disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = Some(disposition.into());
        self
    }

    /// Creates a leaf part from a payload and these attributes.
    ///
    /// `content_type`, `encoding` and `disposition` are the defaults of the
    /// calling operation. The filename is written as an RFC 2231 parameter
    /// when it is not ASCII.
    ///
    /// `7bit` needs ASCII content; `8bit` and `binary` need UTF-8 so the
    /// part has a text form. Other bytes must use `base64` or
    /// `quoted-printable`.
    pub(crate) fn build_part(
        &self,
        payload: Payload,
        mut content_type: ContentType,
        encoding: TransferEncoding,
        disposition: Option<&str>,
    ) -> Result<Part> {
        if let Some(ct) = &self.content_type {
            content_type = ContentType::parse(ct)?;
        }
        if let Some(charset) = &self.charset {
            content_type.set_parameter("charset", charset);
        }
        if let Some(name) = &self.name {
            content_type.set_parameter("name", name);
        }

        let encoding = self.encoding.unwrap_or(encoding);
        check_identity_payload(&payload, encoding)?;

        let mut headers = Headers::new();
        set_checked(&mut headers, "Content-Type", content_type.to_string())?;
        set_checked(&mut headers, "Content-Transfer-Encoding", encoding.to_string())?;

        let disposition = self
            .disposition
            .as_deref()
            .or(disposition)
            .or_else(|| self.filename.as_ref().map(|_| "inline"));
        if let Some(disposition) = disposition {
            let value = match &self.filename {
                Some(filename) => {
                    format!("{disposition}; {}", encode_parameter("filename", filename))
                }
                None => disposition.to_string(),
            };
            set_checked(&mut headers, "Content-Disposition", value)?;
        }

        Ok(Part::leaf(headers, payload))
    }
}

fn set_checked(headers: &mut Headers, name: &str, value: String) -> Result<()> {
    Headers::validate_value(&value)?;
    headers.set(name, value);
    Ok(())
}

fn check_identity_payload(payload: &Payload, encoding: TransferEncoding) -> Result<()> {
    let bytes = payload.as_bytes();
    match encoding {
        TransferEncoding::SevenBit if !bytes.is_ascii() => Err(Error::validation(
            "7bit content must be ASCII; use quoted-printable or base64",
        )),
        TransferEncoding::EightBit | TransferEncoding::Binary
            if std::str::from_utf8(bytes).is_err() =>
        {
            Err(Error::validation(format!(
                "{encoding} content must be UTF-8; use base64 for raw bytes"
            )))
        }
        _ => Ok(()),
    }
}

/// Where attachment content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file on disk, read fully when attached.
    Path(PathBuf),
    /// Content already in memory, with the name it should carry.
    Bytes {
        /// File content.
        data: Vec<u8>,
        /// File name; directory components are stripped.
        name: String,
    },
}

impl FileSource {
    /// Creates an in-memory source.
    #[must_use]
    pub fn bytes(data: impl Into<Vec<u8>>, name: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            name: name.into(),
        }
    }

    /// Loads the content and returns it with its base file name.
    pub(crate) fn load(self) -> Result<(Vec<u8>, String)> {
        match self {
            Self::Path(path) => {
                let data = std::fs::read(&path).map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;
                let name = path.file_name().map_or_else(
                    || path.to_string_lossy().into_owned(),
                    |name| name.to_string_lossy().into_owned(),
                );
                Ok((data, name))
            }
            Self::Bytes { data, name } => {
                let base = name.rsplit(['/', '\\']).next().unwrap_or_default().to_string();
                Ok((data, base))
            }
        }
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for FileSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for FileSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for FileSource {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}
