//! Scenario: `close_async` is called while the engine is still `OPENING`.
//! `on_open_complete` must fire with `OpenResult::Cancelled` before the
//! engine settles into `CLOSED`, and the transport's open attempt must
//! never be polled again afterward.

use std::cell::Cell;
use std::rc::Rc;

use xio_core::{AsyncIoResult, Engine, EngineState, OpenResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn closing_during_open_cancels_the_open_callback() {
    let (transport, handle) = FakeEndpoint::new_pair();
    // The transport never resolves the open on its own; only the close
    // matters for this scenario.
    handle.set_open_result(AsyncIoResult::Waiting);
    let mut engine = Engine::from_parts(transport, FakeConfig::new());

    let open_result = Rc::new(Cell::new(None));
    let open_result_write = open_result.clone();
    engine
        .open_async(move |r| open_result_write.set(Some(r)), |_| {}, || {})
        .unwrap();
    assert_eq!(engine.state(), EngineState::Opening);

    let closed = Rc::new(Cell::new(false));
    let closed_write = closed.clone();
    engine.close_async(move || closed_write.set(true)).unwrap();

    assert_eq!(open_result.get(), Some(OpenResult::Cancelled));
    assert_eq!(engine.state(), EngineState::Closed);
    assert!(closed.get());

    // Ticking a closed engine must be a no-op: no further open polling.
    let open_calls_before = handle.open_calls();
    engine.dowork();
    assert_eq!(handle.open_calls(), open_calls_before);
}
