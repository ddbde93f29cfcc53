//! Scenario: an open attempt fails, driving the engine into `ERROR` and
//! firing `on_open_complete(OpenResult::Error)`. A fresh engine (the
//! caller's retry) then succeeds.

use std::cell::Cell;
use std::rc::Rc;

use xio_core::{AsyncIoResult, Engine, EngineState, OpenResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn failed_open_enters_error_and_a_fresh_engine_can_retry() {
    let (transport, handle) = FakeEndpoint::new_pair();
    handle.set_open_result(AsyncIoResult::Failure);
    let mut engine = Engine::from_parts(transport, FakeConfig::new());

    let open_result = Rc::new(Cell::new(None));
    let open_result_write = open_result.clone();
    let io_errors = Rc::new(Cell::new(0));
    let io_errors_write = io_errors.clone();

    engine
        .open_async(
            move |r| open_result_write.set(Some(r)),
            |_| {},
            move || io_errors_write.set(io_errors_write.get() + 1),
        )
        .unwrap();
    engine.dowork();

    assert_eq!(engine.state(), EngineState::Error);
    assert_eq!(open_result.get(), Some(OpenResult::Error));
    assert_eq!(io_errors.get(), 1);

    // Retrying on the same instance isn't meaningful once ERROR is
    // entered; the caller builds a fresh engine instead.
    let (transport, handle) = FakeEndpoint::new_pair();
    handle.set_open_result(AsyncIoResult::Success);
    let mut retry_engine = Engine::from_parts(transport, FakeConfig::new());
    retry_engine.open_async(|_| {}, |_| {}, || {}).unwrap();
    retry_engine.dowork();
    assert_eq!(retry_engine.state(), EngineState::Open);
}
