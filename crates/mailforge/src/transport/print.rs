//! Transport that prints messages instead of delivering them.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use mailforge_mime::Part;

use super::{DeliveryError, Envelope, Transport, TransportOptions};

/// Writes the envelope and the serialized message to a writer.
pub struct PrintTransport {
    out: Mutex<Box<dyn Write + Send>>,
}

impl PrintTransport {
    /// Creates a transport writing to `out`.
    #[must_use]
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Creates a transport writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl fmt::Debug for PrintTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrintTransport").finish_non_exhaustive()
    }
}

impl Transport for PrintTransport {
    fn send(&self, message: &Part, options: &TransportOptions) -> Result<(), DeliveryError> {
        let envelope = Envelope::from_message(message, options)?;
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);

        writeln!(out, "ENVELOPE TO  : {}", envelope.to.join(", "))?;
        writeln!(out, "ENVELOPE FROM: {}", envelope.from.as_deref().unwrap_or("-"))?;
        writeln!(out, "---------- begin message")?;
        write!(out, "{message}")?;
        writeln!(out, "---------- end message")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailforge_mime::Headers;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prints_envelope_and_message() {
        let buf = SharedBuf::default();
        let transport = PrintTransport::new(buf.clone());

        let mut headers = Headers::new();
        headers.set("From", "me@example.com");
        headers.set("To", "you@example.com");
        let message = Part::empty(headers);

        transport.send(&message, &TransportOptions::new()).unwrap();

        let printed = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(printed.starts_with("ENVELOPE TO  : you@example.com\nENVELOPE FROM: me@example.com\n"));
        assert!(printed.contains("From: me@example.com\r\nTo: you@example.com\r\n\r\n"));
        assert!(printed.ends_with("---------- end message\n"));
    }
}
