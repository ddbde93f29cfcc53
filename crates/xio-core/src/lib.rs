//! `xio-core`: a pluggable, poll-driven asynchronous byte-stream I/O engine.
//!
//! The engine (see [`engine::Engine`]) drives an opaque
//! [`transport::EndpointTransport`] through a non-blocking lifecycle,
//! queueing outbound data in a [`TransmissionQueue`](queue) and surfacing
//! open/close/error/bytes-received/send-complete notifications via
//! callbacks. Concrete transports (a real TLS socket, for instance) are
//! external collaborators — this crate only defines the shape they must
//! satisfy and the state machine that drives them.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

/// `alloc` 绑定策略。
///
/// # 设计背景（Why）
/// - `Engine`、`TransmissionQueue`、`XioError` 都依赖 `Box`/`VecDeque`/`String` 等堆分配类型，
///   在 `no_std` 轨道下仍需要这些能力，否则回调装箱（`Box<dyn FnOnce(..) + Send>`）与
///   `XioEngine` 的对象安全都无法成立。
///
/// # 契约说明（What）
/// - 无论 `std` 特性是否开启，本 crate 都显式 `extern crate alloc;`；`std` 特性只增量开启
///   std 专属能力（目前主要是测试辅助），与 `alloc` 的引入彼此独立。
///
/// # 设计取舍与风险（Trade-offs）
/// - 这意味着真正无堆的平台无法直接使用本 crate；若未来需要支持，应新增一条不依赖堆分配的
///   精简契约，而不是试图让现有类型退化为栈分配。
pub mod config;
pub mod engine;
pub mod error;
pub mod results;
pub mod transport;

mod queue;

pub use config::{EndpointConfig, OptionValue};
pub use engine::{Engine, EngineState, XioEngine};
pub use error::{ErrorCategory, XioError};
pub use results::{OpenResult, SendResult};
pub use transport::{AsyncIoResult, EndpointTransport, TransportIoOutcome};
