//! Scenario: a message larger than the transport's per-call write capacity
//! spans multiple `dowork` ticks before its send-complete callback fires.

use std::cell::Cell;
use std::rc::Rc;

use xio_core::{Engine, SendResult};
use xio_contract_tests::{FakeConfig, FakeEndpoint};

#[test]
fn large_message_completes_across_several_ticks() {
    let (transport, handle) = FakeEndpoint::new_pair();
    let mut engine = Engine::from_parts(transport, FakeConfig::new());

    engine.open_async(|_| {}, |_| {}, || {}).unwrap();
    engine.dowork();

    handle.set_write_cap(16);
    let payload = vec![7u8; 50];

    let result = Rc::new(Cell::new(None));
    let result_write = result.clone();
    engine
        .send_async(&payload, move |r| result_write.set(Some(r)))
        .unwrap();

    // 16 of 50 bytes went out during the opportunistic pump in send_async.
    assert_eq!(result.get(), None);

    engine.dowork(); // 16 -> 32
    assert_eq!(result.get(), None);

    engine.dowork(); // 32 -> 48
    assert_eq!(result.get(), None);

    engine.dowork(); // 48 -> 50, message complete
    assert_eq!(result.get(), Some(SendResult::Ok));
}
