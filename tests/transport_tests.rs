//! End-to-end behaviour of the transport against a loopback listener.

mod test_utils;

use std::time::Duration;

use logstash_udp::{
    LINE_ENDING, Level, LogRecord, SendResult, TransportBuilder, TransportError, TransportEvent,
};
use rstest::rstest;
use serde_json::json;

use test_utils::{Listener, TIMEOUT, listener};

#[rstest]
fn record_round_trips_as_flat_json(listener: Listener) {
    let transport = listener.builder().build().expect("build transport");
    transport.log(LogRecord::new(Level::Info, "hello world"));

    let mut message = listener.recv_json();
    let timestamp = message
        .remove("@timestamp")
        .expect("timestamp present");
    assert!(timestamp.as_str().is_some_and(|ts| ts.ends_with('Z')));
    assert_eq!(
        serde_json::Value::Object(message),
        json!({
            "@version": "1",
            "application": "test",
            "host": "localhost",
            "level": "info",
            "message": "hello world",
        })
    );
}

#[rstest]
fn identity_fields_beat_per_call_fields(listener: Listener) {
    let transport = listener
        .builder()
        .with_meta_field("team", "core")
        .with_meta_field("region", "eu")
        .build()
        .expect("build transport");
    transport.log(
        LogRecord::new(Level::Warn, "precedence")
            .with_field("application", "override")
            .with_field("region", "us")
            .with_field("level", "error"),
    );

    let message = listener.recv_json();
    assert_eq!(message["application"], "test");
    assert_eq!(message["region"], "us");
    assert_eq!(message["team"], "core");
    assert_eq!(message["level"], "warn");
}

#[rstest]
fn framing_strips_trailing_whitespace(listener: Listener) {
    let transport = listener.builder().build().expect("build transport");
    let (tx, rx) = crossbeam_channel::bounded::<SendResult>(1);
    transport.send_message("{\"what\":\"ever\"}\r\n\t ", move |result| {
        let _ = tx.send(result);
    });

    assert!(rx.recv_timeout(TIMEOUT).expect("callback fires").is_ok());
    let expected = format!("{{\"what\":\"ever\"}}{LINE_ENDING}");
    assert_eq!(listener.recv_bytes(), expected.into_bytes());
}

#[rstest]
fn custom_line_terminator_is_used(listener: Listener) {
    let transport = listener
        .builder()
        .with_line_terminator("\r\n")
        .build()
        .expect("build transport");
    transport.send_message("body\n", |_| {});
    assert_eq!(listener.recv_text(), "body\r\n");
}

#[rstest]
fn unresolvable_host_warns_without_blocking() {
    let transport = TransportBuilder::new()
        .with_host("unresolvedhost.invalid")
        .build()
        .expect("build transport");
    let events = transport.subscribe();
    transport.log(LogRecord::new(Level::Info, "lost"));

    match events
        .recv_timeout(Duration::from_secs(15))
        .expect("warn event fires")
    {
        TransportEvent::Warn(TransportError::Send(_)) => {}
        other => panic!("unexpected event {other:?}"),
    }
}

#[rstest]
fn records_arrive_in_order(listener: Listener) {
    let transport = listener.builder().build().expect("build transport");
    for i in 0..20 {
        transport.log(LogRecord::new(Level::Info, format!("msg-{i}")));
    }
    for i in 0..20 {
        assert_eq!(listener.recv_json()["message"], format!("msg-{i}"));
    }
}

#[rstest]
fn silent_transport_sends_nothing(listener: Listener) {
    let transport = listener
        .builder()
        .with_silent(true)
        .build()
        .expect("build transport");
    let (tx, rx) = crossbeam_channel::bounded::<SendResult>(1);
    transport.log_with(LogRecord::new(Level::Error, "hush"), move |result| {
        let _ = tx.send(result);
    });
    assert!(rx.try_recv().expect("callback ran").is_ok());

    // Prove the listener is idle by sending a marker of our own afterwards.
    let marker = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind marker");
    marker
        .send_to(b"marker", ("127.0.0.1", listener.port()))
        .expect("send marker");
    assert_eq!(listener.recv_text(), "marker");
}

#[rstest]
fn dropping_transport_shuts_it_down(listener: Listener) {
    let transport = listener.builder().build().expect("build transport");
    let sender = transport.active_sender();
    drop(transport);
    assert!(sender.wait_closed(TIMEOUT));
    assert!(sender.state().is_terminal());
}
