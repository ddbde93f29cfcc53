//! Scenario: the first message sent after `OPEN` gets its WebSocket upgrade
//! request rewritten to declare "no client certificate" when it starts with
//! the IoT Hub WebSocket prefix, and only that one message is ever eligible.

use xio_core::{Engine, SendResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint, FakeEndpointHandle};

fn opened_engine() -> (Engine<FakeEndpoint>, FakeEndpointHandle) {
    let (transport, handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());
    engine.open_async(|_| {}, |_| {}, || {}).unwrap();
    engine.dowork();
    (engine, handle)
}

#[test]
fn first_message_matching_the_prefix_is_rewritten() {
    let (mut engine, handle) = opened_engine();

    let request = b"GET /$iothub/websocket?foo=bar HTTP/1.1\r\n\r\n";
    engine.send_async(request, |r| assert_eq!(r, SendResult::Ok)).unwrap();

    let mut expected = b"GET /$iothub/websocket".to_vec();
    expected.extend_from_slice(b"?iothub-no-client-cert=true");
    expected.extend_from_slice(b"?foo=bar HTTP/1.1\r\n\r\n");

    assert_eq!(handle.written_bytes(), expected);
}

#[test]
fn message_not_matching_the_prefix_is_sent_unmodified() {
    let (mut engine, handle) = opened_engine();

    let request = b"GET /not-the-websocket-path HTTP/1.1\r\n\r\n";
    engine.send_async(request, |r| assert_eq!(r, SendResult::Ok)).unwrap();

    assert_eq!(handle.written_bytes(), request);
}

#[test]
fn message_shorter_than_the_prefix_is_sent_unmodified() {
    let (mut engine, handle) = opened_engine();

    let request = b"GET /$io";
    engine.send_async(request, |r| assert_eq!(r, SendResult::Ok)).unwrap();

    assert_eq!(handle.written_bytes(), request);
}

#[test]
fn only_the_first_post_open_message_is_ever_eligible_for_rewrite() {
    let (mut engine, handle) = opened_engine();

    let first = b"not a websocket upgrade";
    engine.send_async(first, |r| assert_eq!(r, SendResult::Ok)).unwrap();
    assert_eq!(handle.written_bytes(), first);

    let second = b"GET /$iothub/websocket?foo=bar HTTP/1.1\r\n\r\n";
    engine.send_async(second, |r| assert_eq!(r, SendResult::Ok)).unwrap();

    let mut expected = first.to_vec();
    expected.extend_from_slice(second);
    assert_eq!(handle.written_bytes(), expected);
}
