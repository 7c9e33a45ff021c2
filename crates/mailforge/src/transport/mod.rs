//! Message delivery.
//!
//! A [`Transport`] takes a finished [`Part`] tree and delivers it somewhere.
//! The builder never looks inside a transport; it only calls
//! [`Transport::send`] or [`Transport::try_send`].
//!
//! | Moniker   | Type                 | Description                               |
//! | --------- | -------------------- | ----------------------------------------- |
//! | `Test`    | [`TestTransport`]    | Keeps deliveries in memory for inspection |
//! | `DevNull` | [`DevNullTransport`] | Accepts and drops everything              |
//! | `Print`   | [`PrintTransport`]   | Writes envelope and message to a writer   |
//! | `Mbox`    | [`MboxTransport`]    | Appends to an mbox file                   |
//!
//! Monikers are resolved through an explicit [`TransportRegistry`].

mod mbox;
mod print;
mod registry;
mod stub;

use std::fmt;

use mailforge_mime::{Part, split_address_list};
use serde_json::Value;

pub use mbox::MboxTransport;
pub use print::PrintTransport;
pub use registry::{TransportFactory, TransportRegistry};
pub use stub::{Delivery, DevNullTransport, TestTransport};

/// Options for building a transport or for a single send call.
pub type TransportOptions = serde_json::Map<String, Value>;

/// Errors a transport can report.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The transport refused the message.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// No envelope recipients could be determined.
    #[error("No recipients specified")]
    NoRecipients,

    /// I/O error while writing the message.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivery mechanism for assembled messages.
pub trait Transport: fmt::Debug + Send + Sync {
    /// Delivers a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    fn send(&self, message: &Part, options: &TransportOptions) -> Result<(), DeliveryError>;

    /// Delivers a message, reporting failure as `false`.
    fn try_send(&self, message: &Part, options: &TransportOptions) -> bool {
        match self.send(message, options) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Delivery failed");
                false
            }
        }
    }
}

/// SMTP-style envelope: who the message is from and who receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Envelope sender.
    pub from: Option<String>,
    /// Envelope recipients.
    pub to: Vec<String>,
}

impl Envelope {
    /// Derives the envelope for a message.
    ///
    /// `from` and `to` in `options` take precedence; otherwise the sender
    /// comes from the `From` header and the recipients from `To`, `Cc`
    /// and `Bcc`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::NoRecipients`] if there are no recipients.
    pub fn from_message(message: &Part, options: &TransportOptions) -> Result<Self, DeliveryError> {
        let headers = message.headers();

        let from = match options.get("from").and_then(Value::as_str) {
            Some(from) => Some(from.to_string()),
            None => headers
                .get("From")
                .and_then(|value| extract_addresses(value).into_iter().next()),
        };

        let to = match options.get("to") {
            Some(Value::String(to)) => vec![to.clone()],
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => ["To", "Cc", "Bcc"]
                .iter()
                .filter_map(|name| headers.get(name))
                .flat_map(extract_addresses)
                .collect(),
        };

        if to.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        Ok(Self { from, to })
    }
}

/// Extracts bare addresses from an address header value.
///
/// `"Ann <ann@example.com>, bob@example.com"` yields
/// `["ann@example.com", "bob@example.com"]`.
#[must_use]
pub fn extract_addresses(value: &str) -> Vec<String> {
    split_address_list(value)
        .into_iter()
        .filter_map(|entry| {
            let addr = match (entry.rfind('<'), entry.rfind('>')) {
                (Some(start), Some(end)) if start < end => &entry[start + 1..end],
                _ => entry,
            };
            let addr = addr.trim();
            (!addr.is_empty()).then(|| addr.to_string())
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailforge_mime::Headers;
    use serde_json::json;

    fn message(pairs: &[(&str, &str)]) -> Part {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.set(name, *value);
        }
        Part::empty(headers)
    }

    fn options(value: Value) -> TransportOptions {
        match value {
            Value::Object(map) => map,
            _ => TransportOptions::new(),
        }
    }

    #[test]
    fn test_extract_addresses() {
        assert_eq!(
            extract_addresses("Ann <ann@example.com>, bob@example.com"),
            vec!["ann@example.com", "bob@example.com"]
        );
        assert_eq!(extract_addresses(" , "), Vec::<String>::new());
        assert_eq!(
            extract_addresses(r#""Doe, John" <j@example.com>, "a<b>" <c@example.com>"#),
            vec!["j@example.com", "c@example.com"]
        );
    }

    #[test]
    fn test_envelope_from_headers() {
        let msg = message(&[
            ("From", "Me <me@example.com>"),
            ("To", "a@example.com, b@example.com"),
            ("Cc", "c@example.com"),
            ("Bcc", "d@example.com"),
        ]);
        let envelope = Envelope::from_message(&msg, &TransportOptions::new()).unwrap();
        assert_eq!(envelope.from.as_deref(), Some("me@example.com"));
        assert_eq!(
            envelope.to,
            vec!["a@example.com", "b@example.com", "c@example.com", "d@example.com"]
        );
    }

    #[test]
    fn test_envelope_options_override() {
        let msg = message(&[("From", "me@example.com"), ("To", "a@example.com")]);
        let opts = options(json!({"from": "bounce@example.com", "to": ["x@example.com"]}));
        let envelope = Envelope::from_message(&msg, &opts).unwrap();
        assert_eq!(envelope.from.as_deref(), Some("bounce@example.com"));
        assert_eq!(envelope.to, vec!["x@example.com"]);
    }

    #[test]
    fn test_envelope_requires_recipients() {
        let msg = message(&[("From", "me@example.com")]);
        let err = Envelope::from_message(&msg, &TransportOptions::new()).unwrap_err();
        assert!(matches!(err, DeliveryError::NoRecipients));
    }

    #[derive(Debug)]
    struct Refusing;

    impl Transport for Refusing {
        fn send(&self, _message: &Part, _options: &TransportOptions) -> Result<(), DeliveryError> {
            Err(DeliveryError::Rejected("nope".into()))
        }
    }

    #[test]
    fn test_try_send_swallows_errors() {
        let msg = message(&[("To", "a@example.com")]);
        assert!(!Refusing.try_send(&msg, &TransportOptions::new()));
        assert!(DevNullTransport.try_send(&msg, &TransportOptions::new()));
    }
}
