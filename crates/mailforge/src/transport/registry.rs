//! Moniker → transport constructor lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{
    DevNullTransport, MboxTransport, PrintTransport, TestTransport, Transport, TransportOptions,
};
use crate::error::{Error, Result};

/// Builds a transport from construction options.
pub type TransportFactory =
    Box<dyn Fn(&TransportOptions) -> Result<Arc<dyn Transport>> + Send + Sync>;

/// Explicit mapping from transport monikers to constructors.
///
/// Monikers are matched case-insensitively. The registry is a plain value
/// handed to whoever resolves monikers; there is no global instance.
#[derive(Default)]
pub struct TransportRegistry {
    factories: HashMap<String, TransportFactory>,
}

impl TransportRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in transports.
    ///
    /// - `Test`: option `fail` (string) makes every send fail with that reason
    /// - `DevNull`: no options
    /// - `Print`: writes to standard output, no options
    /// - `Mbox`: option `filename` (string, required)
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register("Test", |options| {
            let transport = match options.get("fail").and_then(Value::as_str) {
                Some(reason) => TestTransport::failing(reason),
                None => TestTransport::new(),
            };
            Ok(Arc::new(transport))
        });
        registry.register("DevNull", |_| Ok(Arc::new(DevNullTransport)));
        registry.register("Print", |_| Ok(Arc::new(PrintTransport::stdout())));
        registry.register("Mbox", |options| {
            let filename = options
                .get("filename")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::config("Mbox transport requires a `filename` option"))?;
            Ok(Arc::new(MboxTransport::new(filename)))
        });

        registry
    }

    /// Registers a constructor under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&TransportOptions) -> Result<Arc<dyn Transport>> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_ascii_lowercase(), Box::new(factory));
    }

    /// Returns true if `name` can be resolved.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered monikers (lowercased), sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the transport registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the moniker is unknown or the options
    /// are unusable.
    pub fn resolve(&self, name: &str, options: &TransportOptions) -> Result<Arc<dyn Transport>> {
        let factory = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::config(format!("Unknown transport: {name}")))?;
        tracing::debug!(transport = name, "Resolved transport moniker");
        factory(options)
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("transports", &self.names())
            .finish()
    }
}
