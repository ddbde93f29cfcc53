//! Scenario: open succeeds, a send completes within one `dowork` tick,
//! inbound bytes reach `on_bytes_received`, and the engine closes cleanly.

use std::cell::RefCell;
use std::rc::Rc;

use xio_core::{Engine, SendResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn happy_send_and_receive_round_trip() {
    let (transport, handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());

    let received: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let received_write = received.clone();

    engine
        .open_async(
            |_| {},
            move |bytes| received_write.borrow_mut().extend_from_slice(bytes),
            || {},
        )
        .unwrap();
    engine.dowork();
    assert_eq!(engine.state(), xio_core::EngineState::Open);
    assert_eq!(handle.open_calls(), 1);

    handle.queue_incoming_bytes(10);

    let send_result: Rc<RefCell<Option<SendResult>>> = Rc::new(RefCell::new(None));
    let send_result_write = send_result.clone();
    engine
        .send_async(b"hello", move |r| *send_result_write.borrow_mut() = Some(r))
        .unwrap();

    // send_async pumps opportunistically, and there is no cap configured,
    // so the message should already be gone from the queue.
    assert_eq!(*send_result.borrow(), Some(SendResult::Ok));

    engine.dowork();
    assert_eq!(received.borrow().as_slice(), &[0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9]);

    let closed = Rc::new(RefCell::new(false));
    let closed_write = closed.clone();
    engine.close_async(move || *closed_write.borrow_mut() = true).unwrap();
    assert!(*closed.borrow());
    assert_eq!(handle.close_calls(), 1);
}
