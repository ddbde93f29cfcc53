//! Scriptable fake endpoint transport/config used to exercise
//! `xio-core`'s engine against the scenarios its test suite names, the way
//! the upstream project's unit tests pulled a shared `fake_endpoint.h` out
//! of the suite that exercised it.
//!
//! [`FakeEndpoint`] implements [`EndpointTransport`]; [`FakeEndpointHandle`]
//! is a cloneable, thread-safe handle a test holds onto *after* the
//! `FakeEndpoint` has been moved into an `Engine` via
//! [`Engine::from_parts`](xio_core::Engine::from_parts), so that a test can
//! still script read data, write behavior, and open/close outcomes from the
//! outside as the engine runs.

use std::sync::Arc;

use parking_lot::Mutex;
use xio_core::{AsyncIoResult, EndpointConfig, EndpointTransport, OptionValue, TransportIoOutcome, XioError};
use xio_core::ErrorCategory;

struct FakeState {
    open_result: AsyncIoResult,
    close_result: AsyncIoResult,
    read_total: usize,
    read_delivered: usize,
    write_cap: Option<usize>,
    write_fail_size: Option<usize>,
    open_calls: u32,
    close_calls: u32,
    written: Vec<u8>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            open_result: AsyncIoResult::Success,
            close_result: AsyncIoResult::Success,
            read_total: 0,
            read_delivered: 0,
            write_cap: None,
            write_fail_size: None,
            open_calls: 0,
            close_calls: 0,
            written: Vec::new(),
        }
    }
}

/// A handle a test keeps to steer a [`FakeEndpoint`] already handed off to
/// an engine.
#[derive(Clone)]
pub struct FakeEndpointHandle {
    shared: Arc<Mutex<FakeState>>,
}

impl FakeEndpointHandle {
    pub fn set_open_result(&self, result: AsyncIoResult) {
        self.shared.lock().open_result = result;
    }

    pub fn set_close_result(&self, result: AsyncIoResult) {
        self.shared.lock().close_result = result;
    }

    /// Makes `count` more bytes available to the next `read` calls,
    /// delivered as the sequence `i % 256` the way the upstream fake did.
    pub fn queue_incoming_bytes(&self, count: usize) {
        self.shared.lock().read_total += count;
    }

    /// Caps every future `write` at `cap` bytes, modeling a transport that
    /// only accepts partial writes per call.
    pub fn set_write_cap(&self, cap: usize) {
        self.shared.lock().write_cap = Some(cap);
    }

    /// Makes the next `write` called with exactly `size` bytes offered
    /// report a hard failure, mirroring the upstream fake's
    /// `SSL_FAIL_ME_SENT_MESSAGE_SIZE` trigger.
    pub fn fail_write_at(&self, size: usize) {
        self.shared.lock().write_fail_size = Some(size);
    }

    pub fn open_calls(&self) -> u32 {
        self.shared.lock().open_calls
    }

    pub fn close_calls(&self) -> u32 {
        self.shared.lock().close_calls
    }

    /// Every byte ever accepted by `write`, in the order the transport saw
    /// it — the concatenation property tests assert against this.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.shared.lock().written.clone()
    }
}

/// A transport double whose `open`/`close` outcomes and `read`/`write`
/// behavior are scripted from the outside through a [`FakeEndpointHandle`].
pub struct FakeEndpoint {
    shared: Arc<Mutex<FakeState>>,
}

impl FakeEndpoint {
    /// Builds a connected transport/handle pair sharing the same script.
    pub fn new_pair() -> (Self, FakeEndpointHandle) {
        let shared = Arc::new(Mutex::new(FakeState::default()));
        (
            Self {
                shared: shared.clone(),
            },
            FakeEndpointHandle { shared },
        )
    }
}

impl EndpointTransport for FakeEndpoint {
    type Config = FakeConfig;

    fn create() -> Option<Self> {
        Some(Self {
            shared: Arc::new(Mutex::new(FakeState::default())),
        })
    }

    fn open(&mut self, _config: &FakeConfig) -> AsyncIoResult {
        let mut state = self.shared.lock();
        state.open_calls += 1;
        if state.open_result == AsyncIoResult::Failure {
            tracing::debug!(target: "xio_contract_tests", "scripted open failure delivered");
        }
        state.open_result
    }

    fn close(&mut self) -> AsyncIoResult {
        let mut state = self.shared.lock();
        state.close_calls += 1;
        if state.close_result == AsyncIoResult::Failure {
            tracing::debug!(target: "xio_contract_tests", "scripted close failure delivered");
        }
        state.close_result
    }

    fn read(&mut self, buf: &mut [u8]) -> TransportIoOutcome {
        let mut state = self.shared.lock();
        let remaining = state.read_total - state.read_delivered;
        let n = remaining.min(buf.len());
        if n == 0 {
            return TransportIoOutcome::WouldBlock;
        }
        for (i, slot) in buf[..n].iter_mut().enumerate() {
            *slot = ((state.read_delivered + i) % 256) as u8;
        }
        state.read_delivered += n;
        TransportIoOutcome::Transferred(n)
    }

    fn write(&mut self, buf: &[u8]) -> TransportIoOutcome {
        let mut state = self.shared.lock();
        if let Some(fail_size) = state.write_fail_size {
            if buf.len() == fail_size {
                tracing::debug!(target: "xio_contract_tests", size = fail_size, "scripted write failure delivered");
                return TransportIoOutcome::Failed;
            }
        }
        let n = match state.write_cap {
            Some(cap) if buf.len() > cap => cap,
            _ => buf.len(),
        };
        if n == 0 {
            TransportIoOutcome::WouldBlock
        } else {
            state.written.extend_from_slice(&buf[..n]);
            TransportIoOutcome::Transferred(n)
        }
    }
}

/// Minimal configuration bag paired with [`FakeEndpoint`]. Accepts a single
/// `"dummy"` integer option, mirroring the upstream `fake_config { int
/// dummy; }` test double — just enough surface to exercise `set_option`/
/// `retrieve_options` without modeling real TLS knobs.
#[derive(Default)]
pub struct FakeConfig {
    dummy: i64,
}

impl FakeConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EndpointConfig for FakeConfig {
    type Options = i64;

    fn set_option(&mut self, name: &str, value: OptionValue<'_>) -> Result<(), XioError> {
        match (name, value) {
            ("dummy", OptionValue::Int(v)) => {
                self.dummy = v;
                Ok(())
            }
            _ => Err(XioError::new(
                "fake.unknown_option",
                ErrorCategory::Argument,
                format!("FakeConfig has no option named {name:?}"),
            )),
        }
    }

    fn retrieve_options(&self) -> Option<i64> {
        Some(self.dummy)
    }
}
