//! Composes a message with both bodies and an attachment and prints it.
//!
//! Run with: `cargo run -p mailforge --example compose [FILE]`
//!
//! Set `RUST_LOG=mailforge=debug` to see assembly decisions.

use std::sync::Arc;

use mailforge::{FileSource, MessageBuilder, PartAttributes, PrintTransport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailforge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let attachment = std::env::args().nth(1).map_or_else(
        || FileSource::bytes(b"name,total\nwidgets,42\n".to_vec(), "totals.csv"),
        FileSource::from,
    );

    let builder = MessageBuilder::new()
        .from(["Reports <reports@example.com>"])?
        .to(["alice@example.com", "bob@example.com"])?
        .cc(["archive@example.com"])?
        .subject("Weekly totals")?
        .header("X-Mailer", "mailforge")?
        .text_body("Totals are attached.\n")
        .html_body("<p>Totals are <b>attached</b>.</p>\n")
        .attach_file(attachment, &PartAttributes::new())?
        .transport(Arc::new(PrintTransport::stdout()));

    builder.send_or_die(None)?;
    Ok(())
}
