//! Boundary behaviors called out alongside the six end-to-end scenarios:
//! `send_async` rejecting an empty buffer, and a `WouldBlock` write leaving
//! the head message untouched rather than partially consumed.
//!
//! The `send_async` size ceiling at `i32::MAX` is exercised as a pure
//! function unit test in `xio-core/src/engine.rs` instead of here, since
//! reproducing it at this layer would mean allocating a multi-gigabyte
//! buffer just to exercise a length comparison.

use std::cell::Cell;
use std::rc::Rc;

use xio_core::{Engine, EngineState, ErrorCategory};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn send_async_rejects_zero_length_buffer() {
    let (transport, _handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());
    engine.open_async(|_| {}, |_| {}, || {}).unwrap();
    engine.dowork();
    assert_eq!(engine.state(), EngineState::Open);

    let err = engine.send_async(&[], |_| {}).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Argument);
}

#[test]
fn would_block_write_leaves_head_message_unchanged() {
    let (transport, handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());
    engine.open_async(|_| {}, |_| {}, || {}).unwrap();
    engine.dowork();

    handle.set_write_cap(0);
    let completed = Rc::new(Cell::new(false));
    let completed_write = completed.clone();
    engine
        .send_async(b"unsent", move |_| completed_write.set(true))
        .unwrap();
    assert!(!completed.get());

    for _ in 0..5 {
        engine.dowork();
        assert!(
            !completed.get(),
            "a WouldBlock write must never complete the head message"
        );
    }
}
