//! In-process transports that never leave the process.

use std::sync::{Mutex, PoisonError};

use mailforge_mime::Part;

use super::{DeliveryError, Envelope, Transport, TransportOptions};

/// A message accepted by a [`TestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Envelope the message was sent with.
    pub envelope: Envelope,
    /// The message tree as handed to the transport.
    pub message: Part,
}

/// Records every delivery in memory.
///
/// Useful in tests: hand an `Arc<TestTransport>` to the builder, keep a
/// clone, and inspect [`TestTransport::deliveries`] afterwards.
#[derive(Debug, Default)]
pub struct TestTransport {
    deliveries: Mutex<Vec<Delivery>>,
    failure: Option<String>,
}

impl TestTransport {
    /// Creates a transport that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that rejects every message with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            deliveries: Mutex::default(),
            failure: Some(reason.into()),
        }
    }

    /// Returns the deliveries made so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of deliveries made so far.
    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forgets all recorded deliveries.
    pub fn clear(&self) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Transport for TestTransport {
    fn send(&self, message: &Part, options: &TransportOptions) -> Result<(), DeliveryError> {
        if let Some(reason) = &self.failure {
            return Err(DeliveryError::Rejected(reason.clone()));
        }

        let envelope = Envelope::from_message(message, options)?;
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                envelope,
                message: message.clone(),
            });
        Ok(())
    }
}

/// Accepts and discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevNullTransport;

impl Transport for DevNullTransport {
    fn send(&self, _message: &Part, _options: &TransportOptions) -> Result<(), DeliveryError> {
        Ok(())
    }
}
