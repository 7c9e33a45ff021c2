//! Transport that appends messages to an mbox file.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use mailforge_mime::Part;

use super::{DeliveryError, Envelope, Transport, TransportOptions};

/// Sender used on the `From ` line when the envelope has none.
const UNKNOWN_SENDER: &str = "MAILER-DAEMON";

/// Appends each message to an mbox file (mboxrd flavour).
///
/// Every record starts with a `From sender date` line; body lines that
/// begin with any number of `>` followed by `From ` get one more `>`.
#[derive(Debug)]
pub struct MboxTransport {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MboxTransport {
    /// Creates a transport appending to `path`. The file is created on the
    /// first delivery if it does not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Mailbox file this transport writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for MboxTransport {
    fn send(&self, message: &Part, options: &TransportOptions) -> Result<(), DeliveryError> {
        let envelope = Envelope::from_message(message, options)?;
        let sender = envelope.from.as_deref().unwrap_or(UNKNOWN_SENDER);
        let date = Utc::now().format("%a %b %e %H:%M:%S %Y");

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut out = BufWriter::new(file);

        writeln!(out, "From {sender} {date}")?;
        for line in message.to_string().lines() {
            if is_from_line(line) {
                out.write_all(b">")?;
            }
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
        out.flush()?;

        tracing::debug!(path = %self.path.display(), "Appended message to mbox");
        Ok(())
    }
}

fn is_from_line(line: &str) -> bool {
    line.trim_start_matches('>').starts_with("From ")
}
