//! Scenario: `close_async` is called while messages are still queued. Every
//! outstanding send-complete callback fires with `SendResult::Cancelled`.

use std::cell::RefCell;
use std::rc::Rc;

use xio_core::{Engine, SendResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn close_cancels_every_queued_message() {
    let (transport, handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());

    engine.open_async(|_| {}, |_| {}, || {}).unwrap();
    engine.dowork();

    // Nothing will ever leave the transport, so every send stays queued.
    handle.set_write_cap(0);

    let outcomes: Rc<RefCell<Vec<SendResult>>> = Rc::new(RefCell::new(Vec::new()));
    for payload in [&b"one"[..], &b"two"[..], &b"three"[..]] {
        let outcomes_write = outcomes.clone();
        engine
            .send_async(payload, move |r| outcomes_write.borrow_mut().push(r))
            .unwrap();
    }
    assert!(outcomes.borrow().is_empty());

    engine.close_async(|| {}).unwrap();

    assert_eq!(
        outcomes.borrow().as_slice(),
        &[SendResult::Cancelled, SendResult::Cancelled, SendResult::Cancelled],
    );
}
