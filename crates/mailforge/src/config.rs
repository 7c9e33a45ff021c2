//! One-call construction from a key/value mapping.
//!
//! ```ignore
//! use serde_json::json;
//!
//! let config = json!({
//!     "from": "sender@example.com",
//!     "to": ["a@example.com", "b@example.com"],
//!     "subject": "Hello",
//!     "text_body": "Hi there",
//!     "transport": ["Mbox", {"filename": "/var/mail/sent"}],
//! });
//! let builder = MessageBuilder::from_config(config.as_object().unwrap(), &registry)?;
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::builder::MessageBuilder;
use crate::error::{Error, Result};
use crate::transport::{TransportOptions, TransportRegistry};

/// Recognized keys, in the order they are applied.
pub const CONFIG_KEYS: [&str; 9] = [
    "to",
    "from",
    "cc",
    "bcc",
    "reply_to",
    "subject",
    "text_body",
    "html_body",
    "transport",
];

/// A scalar or a list, for keys that take several values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// `"Name"`, `["Name"]` or `["Name", {options}]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransportSetting {
    Name(String),
    WithOptions(String, TransportOptions),
    NameOnly((String,)),
}

impl TransportSetting {
    fn into_parts(self) -> (String, TransportOptions) {
        match self {
            Self::Name(name) | Self::NameOnly((name,)) => (name, TransportOptions::new()),
            Self::WithOptions(name, options) => (name, options),
        }
    }
}

impl MessageBuilder {
    /// Creates a builder from a mapping of the keys in [`CONFIG_KEYS`].
    ///
    /// Address keys and `transport` accept a single value or a list.
    /// A `null` body is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every unrecognized key, or if a value
    /// has the wrong shape or the transport cannot be resolved; returns
    /// [`Error::Validation`] for values the setters reject.
    pub fn from_config(config: &Map<String, Value>, registry: &TransportRegistry) -> Result<Self> {
        let mut unknown: Vec<&str> = config
            .keys()
            .map(String::as_str)
            .filter(|key| !CONFIG_KEYS.contains(key))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(Error::config(format!(
                "Unknown configuration keys: {}",
                unknown.join(", ")
            )));
        }

        let mut builder = Self::new();
        for key in CONFIG_KEYS {
            if let Some(value) = config.get(key) {
                builder = builder.apply_config(key, value, registry)?;
            }
        }
        Ok(builder)
    }

    fn apply_config(self, key: &str, value: &Value, registry: &TransportRegistry) -> Result<Self> {
        match key {
            "to" => self.to(parse_list(key, value)?),
            "from" => self.from(parse_list(key, value)?),
            "cc" => self.cc(parse_list(key, value)?),
            "bcc" => self.bcc(parse_list(key, value)?),
            "reply_to" => self.reply_to(parse_list(key, value)?),
            "subject" => match value {
                Value::String(subject) => self.subject(subject.as_str()),
                Value::Null => Err(Error::validation("Subject is required")),
                other => Err(wrong_shape(key, other)),
            },
            "text_body" => match value {
                Value::String(body) => Ok(self.text_body(body.as_str())),
                Value::Null => Ok(self),
                other => Err(wrong_shape(key, other)),
            },
            "html_body" => match value {
                Value::String(body) => Ok(self.html_body(body.as_str())),
                Value::Null => Ok(self),
                other => Err(wrong_shape(key, other)),
            },
            "transport" => {
                let setting = TransportSetting::deserialize(value)
                    .map_err(|_| wrong_shape(key, value))?;
                let (name, options) = setting.into_parts();
                self.transport_named(&name, &options, registry)
            }
            _ => Err(Error::config(format!("Unknown configuration key: {key}"))),
        }
    }
}

fn parse_list(key: &str, value: &Value) -> Result<Vec<String>> {
    OneOrMany::deserialize(value)
        .map(OneOrMany::into_vec)
        .map_err(|_| wrong_shape(key, value))
}

fn wrong_shape(key: &str, value: &Value) -> Error {
    Error::config(format!("Unexpected value for `{key}`: {value}"))
}
