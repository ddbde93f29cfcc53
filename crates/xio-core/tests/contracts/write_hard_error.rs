//! Scenario: the transport reports a hard write failure. The in-flight
//! message's callback fires `SendResult::Error` and the engine falls into
//! `ERROR`, notifying `on_io_error` exactly once.

use std::cell::Cell;
use std::rc::Rc;

use xio_core::{Engine, EngineState, SendResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn write_failure_errors_the_in_flight_message_and_the_engine() {
    let (transport, handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());

    let io_errors = Rc::new(Cell::new(0));
    let io_errors_write = io_errors.clone();
    engine
        .open_async(|_| {}, |_| {}, move || io_errors_write.set(io_errors_write.get() + 1))
        .unwrap();
    engine.dowork();

    handle.fail_write_at(5);

    let result = Rc::new(Cell::new(None));
    let result_write = result.clone();
    engine
        .send_async(b"hello", move |r| result_write.set(Some(r)))
        .unwrap();

    assert_eq!(result.get(), Some(SendResult::Error));
    assert_eq!(engine.state(), EngineState::Error);
    assert_eq!(io_errors.get(), 1);

    // A later tick must not re-fire on_io_error: ERROR is a terminal,
    // idempotent state.
    engine.dowork();
    assert_eq!(io_errors.get(), 1);
}
