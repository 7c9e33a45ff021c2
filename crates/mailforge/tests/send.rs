//! Integration tests for handing built messages to transports.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use mailforge::{
    DeliveryError, Error, MessageBuilder, TestTransport, TransportOptions, TransportRegistry,
};
use serde_json::{Value, json};

fn options(value: Value) -> TransportOptions {
    match value {
        Value::Object(map) => map,
        _ => TransportOptions::new(),
    }
}

fn message() -> MessageBuilder {
    MessageBuilder::new()
        .from(["Sender <sender@example.com>"])
        .unwrap()
        .to(["a@example.com", "b@example.com"])
        .unwrap()
        .bcc(["hidden@example.com"])
        .unwrap()
        .subject("Delivery")
        .unwrap()
        .text_body("body")
}

#[test]
fn test_send_records_delivery() {
    let transport = Arc::new(TestTransport::new());
    let builder = message().transport(transport.clone());

    assert!(builder.send(None));
    assert!(builder.send(None));

    let deliveries = transport.deliveries();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].envelope.from.as_deref(), Some("sender@example.com"));
    assert_eq!(
        deliveries[0].envelope.to,
        vec!["a@example.com", "b@example.com", "hidden@example.com"]
    );
    assert_eq!(deliveries[0].message, builder.build());
    assert_eq!(deliveries[0].message, deliveries[1].message);
}

#[test]
fn test_send_options_override_envelope() {
    let transport = Arc::new(TestTransport::new());
    let builder = message().transport(transport.clone());

    let opts = options(json!({"from": "bounces@example.com", "to": "only@example.com"}));
    assert!(builder.send(Some(&opts)));

    let delivery = &transport.deliveries()[0];
    assert_eq!(delivery.envelope.from.as_deref(), Some("bounces@example.com"));
    assert_eq!(delivery.envelope.to, vec!["only@example.com"]);
}

#[test]
fn test_send_without_transport() {
    let builder = message();
    assert!(!builder.send(None));

    let err = builder.send_or_die(None).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_failing_transport() {
    let builder = message().transport(Arc::new(TestTransport::failing("quota exceeded")));

    assert!(!builder.send(None));

    let err = builder.send_or_die(None).unwrap_err();
    match err {
        Error::Delivery(DeliveryError::Rejected(reason)) => assert_eq!(reason, "quota exceeded"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_send_without_recipients_fails() {
    let builder = MessageBuilder::new()
        .from(["sender@example.com"])
        .unwrap()
        .text_body("nobody")
        .transport(Arc::new(TestTransport::new()));

    assert!(!builder.send(None));
    let err = builder.send_or_die(None).unwrap_err();
    assert!(matches!(err, Error::Delivery(DeliveryError::NoRecipients)));
}

#[test]
fn test_transport_named() {
    let registry = TransportRegistry::with_defaults();

    let builder = message()
        .transport_named("devnull", &TransportOptions::new(), &registry)
        .unwrap();
    assert!(builder.send_or_die(None).is_ok());

    let err = message()
        .transport_named("Smoke-Signal", &TransportOptions::new(), &registry)
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_mbox_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outbox.mbox");
    let registry = TransportRegistry::with_defaults();

    let builder = message()
        .transport_named(
            "Mbox",
            &options(json!({"filename": path.to_string_lossy()})),
            &registry,
        )
        .unwrap();
    builder.send_or_die(None).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("From sender@example.com "));
    assert!(content.contains("Subject: Delivery\n"));
}

#[test]
fn test_custom_transport_in_registry() {
    let shared = Arc::new(TestTransport::new());
    let mut registry = TransportRegistry::new();
    let handle = shared.clone();
    registry.register("Capture", move |_| Ok(handle.clone()));

    let config = options(json!({
        "to": "a@example.com",
        "subject": "Configured",
        "text_body": "hi",
        "transport": "capture",
    }));
    let builder = MessageBuilder::from_config(&config, &registry).unwrap();

    assert!(builder.send(None));
    assert_eq!(shared.delivery_count(), 1);
    assert_eq!(
        shared.deliveries()[0].message.headers().get("Subject"),
        Some("Configured")
    );
}
