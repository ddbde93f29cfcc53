//! The I/O Engine: a single-threaded, poll-driven state machine that owns a
//! transmission queue and an opaque [`EndpointTransport`], surfacing
//! open/close/error/bytes-received/send-complete notifications through
//! callbacks supplied at `open_async`/`send_async` time.
//!
//! Lifecycle: `CLOSED -> OPENING -> OPEN -> (CLOSING ->) CLOSED`, with any
//! state able to fall into `ERROR` on an unrecoverable transport failure.
//! Nothing here blocks: every operation either completes immediately or
//! leaves work for the next [`Engine::dowork`] tick.

use alloc::boxed::Box;
#[cfg(feature = "no-cert-header-rewrite")]
use alloc::vec::Vec;
use core::any::Any;

use crate::config::{EndpointConfig, OptionValue};
use crate::error::{ErrorCategory, XioError, codes};
use crate::queue::{PendingMessage, TransmissionQueue};
use crate::results::{OpenResult, SendResult};
use crate::transport::{AsyncIoResult, EndpointTransport, TransportIoOutcome};

/// Size of the stack buffer the receive pump reads into on every pass. The
/// upstream implementation used a 64-byte buffer regardless of platform;
/// this port keeps the same contract (see the design notes on the Apple
/// receive-path quirk this constant traces back to).
const RECEIVE_BUFFER_SIZE: usize = 64;

/// `send_async` rejects anything at or above this size, mirroring the
/// original `size >= INT_MAX` boundary.
const MAX_SEND_SIZE: usize = i32::MAX as usize;

#[cfg(feature = "no-cert-header-rewrite")]
const WEBSOCKET_HEADER_START: &[u8] = b"GET /$iothub/websocket";
#[cfg(feature = "no-cert-header-rewrite")]
const WEBSOCKET_HEADER_NO_CERT_PARAM: &[u8] = b"?iothub-no-client-cert=true";

/// Pulled out of `send_async` so the boundary (empty, and at/above
/// `i32::MAX`) can be unit tested without allocating a multi-gigabyte
/// buffer just to exercise a length comparison.
fn check_send_size(len: usize) -> Result<(), XioError> {
    if len == 0 || len >= MAX_SEND_SIZE {
        tracing::error!(target: "xio_core::engine", size = len, "send_async called with an invalid size");
        return Err(XioError::new(
            codes::ENGINE_SEND_SIZE,
            ErrorCategory::Argument,
            "send buffer must be non-empty and below i32::MAX bytes",
        ));
    }
    Ok(())
}

/// 引擎生命周期状态机的五个状态。
///
/// # 契约说明（What）
/// - 合法迁移仅有 `Closed -> Opening -> Open -> (Closing ->) Closed`，以及从任意状态（除
///   `Closed` 自身）迁入 `Error`；`Error` 是终态，只能通过 `close_async` 离开回到 `Closed`。
///   不存在从 `Error` 自动恢复的路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Closed,
    Opening,
    Open,
    Closing,
    Error,
}

/// 调用方在不知道（或不关心）具体 [`EndpointTransport`] 实现时持有的对象安全接口——对应上游
/// `IO_INTERFACE_DESCRIPTION` 函数指针表的 Rust 版本。绑定 crate（例如 `xio-tlsio-basic`）构造
/// 一个具体的 `Engine<T>`，再把它装箱为 `Box<dyn XioEngine>` 交还给调用方。
///
/// # 设计背景（Why）
/// - `Engine<T>` 本身是泛型的，单态化后零成本，但调用方往往需要在运行时持有"某种引擎"而不必在
///   签名里写出具体传输类型；这个 trait 就是两者之间的桥——把泛型方法擦除为装箱闭包参数。
///
/// # 逻辑解析（How）
/// - 每个方法都是对应 `Engine<T>` 方法的装箱转发版本：回调从 `impl Trait` 改为 `Box<dyn Trait>`，
///   `retrieve_options` 的关联类型返回值改为 `Box<dyn Any + Send>`，调用方需要自行 downcast。
pub trait XioEngine: Send {
    fn state(&self) -> EngineState;

    fn open_async_dyn(
        &mut self,
        on_open_complete: Box<dyn FnOnce(OpenResult) + Send>,
        on_bytes_received: Box<dyn FnMut(&[u8]) + Send>,
        on_io_error: Box<dyn FnMut() + Send>,
    ) -> Result<(), XioError>;

    fn close_async_dyn(
        &mut self,
        on_close_complete: Box<dyn FnOnce() + Send>,
    ) -> Result<(), XioError>;

    fn send_async_dyn(
        &mut self,
        buffer: &[u8],
        on_send_complete: Box<dyn FnOnce(SendResult) + Send>,
    ) -> Result<(), XioError>;

    fn dowork(&mut self);

    fn set_option(&mut self, name: &str, value: OptionValue<'_>) -> Result<(), XioError>;

    /// Type-erased `retrieve_options`; the caller downcasts to whatever
    /// `Options` type its transport family's config exposes.
    fn retrieve_options_dyn(&self) -> Option<Box<dyn Any + Send>>;
}

/// 驱动某一具体传输家族的引擎实例。
///
/// # 设计背景（Why）
/// - 上游 `xio_impl.c` 把状态机、发送队列和三个回调指针捆在一个不透明句柄里，靠函数指针表接入
///   具体传输；这里用泛型参数 `T: EndpointTransport` 在编译期完成同样的绑定，单态化后没有虚调用
///   开销，且回调参数的生命周期由 Rust 借用检查保证，不需要上游那样手动管理的用户上下文指针。
///
/// # 逻辑解析（How）
/// - `state` 是唯一的真相来源，所有方法都先查它再决定做什么；三个回调在 `open_async` 时整体存入，
///   在状态机推进过程中被 `take`（一次性回调）或可变借用（多次回调）调用；`queue` 只在 `OPEN`/
///   `CLOSING` 排空阶段持有待发送消息。
///
/// # 契约说明（What）
/// - **前置条件**：`T::Config` 必须与 `T` 属于同一传输家族（由 `EndpointTransport::Config`
///   关联类型保证）。
/// - **后置条件**：引擎被 drop 时若仍处于非 `Closed` 状态，会在 [`Drop`] 实现里补一次
///   `internal_close`，保证传输层不会被跳过关闭。
pub struct Engine<T: EndpointTransport> {
    state: EngineState,
    transport: T,
    config: T::Config,
    queue: TransmissionQueue,
    on_open_complete: Option<Box<dyn FnOnce(OpenResult) + Send>>,
    on_bytes_received: Option<Box<dyn FnMut(&[u8]) + Send>>,
    on_io_error: Option<Box<dyn FnMut() + Send>>,
    #[cfg(feature = "no-cert-header-rewrite")]
    no_messages_yet_sent: bool,
}

impl<T: EndpointTransport> Engine<T> {
    /// Allocates a transport instance via `T::create()` and wraps it in a
    /// fresh, `CLOSED` engine.
    pub fn create(config: T::Config) -> Result<Self, XioError> {
        let transport = T::create().ok_or_else(|| {
            tracing::error!(target: "xio_core::engine", "transport family failed to allocate an instance");
            XioError::new(
                codes::TRANSPORT_CREATE_FAILED,
                ErrorCategory::Allocation,
                "transport family failed to allocate an instance",
            )
        })?;
        Ok(Self::from_parts(transport, config))
    }

    /// Wraps an already-constructed transport instance in a fresh engine,
    /// bypassing `T::create()`. Exists for callers (notably contract tests)
    /// that need to wire up a pre-scripted transport instance rather than
    /// let the engine allocate one opaquely.
    pub fn from_parts(transport: T, config: T::Config) -> Self {
        Self {
            state: EngineState::Closed,
            transport,
            config,
            queue: TransmissionQueue::new(),
            on_open_complete: None,
            on_bytes_received: None,
            on_io_error: None,
            #[cfg(feature = "no-cert-header-rewrite")]
            no_messages_yet_sent: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn open_async_boxed(
        &mut self,
        on_open_complete: Box<dyn FnOnce(OpenResult) + Send>,
        on_bytes_received: Box<dyn FnMut(&[u8]) + Send>,
        on_io_error: Box<dyn FnMut() + Send>,
    ) -> Result<(), XioError> {
        if self.state != EngineState::Closed {
            tracing::error!(target: "xio_core::engine", state = ?self.state, "open_async called from a non-CLOSED state");
            return Err(XioError::new(
                codes::ENGINE_INVALID_STATE,
                ErrorCategory::Precondition,
                "open_async requires the engine to be CLOSED",
            ));
        }
        self.on_open_complete = Some(on_open_complete);
        self.on_bytes_received = Some(on_bytes_received);
        self.on_io_error = Some(on_io_error);
        #[cfg(feature = "no-cert-header-rewrite")]
        {
            self.no_messages_yet_sent = true;
        }
        self.state = EngineState::Opening;
        tracing::debug!(target: "xio_core::engine", "engine entering OPENING");
        Ok(())
    }

    /// 开始打开引擎。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：引擎必须处于 `Closed`，否则返回 [`ErrorCategory::Precondition`] 且不产生
    ///   任何状态变化或回调。
    /// - **后置条件**：成功调用后引擎进入 `Opening`，三个回调被保存以供后续 `dowork` 推进时使用；
    ///   `on_open_complete` 保证恰好触发一次（`Ok`/`Error`/`Cancelled` 三选一）。
    pub fn open_async(
        &mut self,
        on_open_complete: impl FnOnce(OpenResult) + Send + 'static,
        on_bytes_received: impl FnMut(&[u8]) + Send + 'static,
        on_io_error: impl FnMut() + Send + 'static,
    ) -> Result<(), XioError> {
        self.open_async_boxed(
            Box::new(on_open_complete),
            Box::new(on_bytes_received),
            Box::new(on_io_error),
        )
    }

    fn close_async_boxed(
        &mut self,
        on_close_complete: Box<dyn FnOnce() + Send>,
    ) -> Result<(), XioError> {
        tracing::debug!(target: "xio_core::engine", state = ?self.state, "close_async called");
        if self.state == EngineState::Opening {
            if let Some(cb) = self.on_open_complete.take() {
                cb(OpenResult::Cancelled);
            }
        }
        self.internal_close();
        on_close_complete();
        Ok(())
    }

    /// 开始关闭引擎，丢弃所有排队中的发送消息（以 `SendResult::Cancelled` 结算），若有连接尝试
    /// 正在进行则先以 `OpenResult::Cancelled` 结算它。
    ///
    /// # 契约说明（What）
    /// - 可以在任意状态下调用，包括已经 `Closed`（幂等）；`on_close_complete` 总是在返回前同步
    ///   触发一次，即使传输层的 `close()` 本身需要多次 `dowork` 轮询才能完成（此时引擎落入
    ///   `Closing`，但调用方的回调已经触发——对调用方而言"关闭请求已受理"与"传输层真正断开"是
    ///   两件事，这与上游契约一致）。
    pub fn close_async(
        &mut self,
        on_close_complete: impl FnOnce() + Send + 'static,
    ) -> Result<(), XioError> {
        self.close_async_boxed(Box::new(on_close_complete))
    }

    fn send_async_boxed(
        &mut self,
        buffer: &[u8],
        on_send_complete: Box<dyn FnOnce(SendResult) + Send>,
    ) -> Result<(), XioError> {
        check_send_size(buffer.len())?;
        if self.state != EngineState::Open {
            tracing::error!(target: "xio_core::engine", state = ?self.state, "send_async called while not OPEN");
            return Err(XioError::new(
                codes::ENGINE_INVALID_STATE,
                ErrorCategory::Precondition,
                "send_async requires the engine to be OPEN",
            ));
        }
        let bytes = self.prepare_outbound_bytes(buffer);
        self.queue
            .push_back(PendingMessage::new(bytes, on_send_complete));
        self.dowork_send();
        Ok(())
    }

    /// 将 `buffer` 加入发送队列，并在返回前顺带推进一次发送泵。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`buffer` 非空、长度严格小于 `i32::MAX`，且引擎处于 `Open`；否则返回错误，
    ///   队列不受影响。
    /// - **后置条件**：消息一旦成功入队，`on_send_complete` 保证最终恰好触发一次；若这是进入
    ///   `Open` 之后的第一条消息且启用了 `no-cert-header-rewrite` 特性，消息内容可能先被
    ///   [`Self::prepare_outbound_bytes`] 改写。
    pub fn send_async(
        &mut self,
        buffer: &[u8],
        on_send_complete: impl FnOnce(SendResult) + Send + 'static,
    ) -> Result<(), XioError> {
        self.send_async_boxed(buffer, Box::new(on_send_complete))
    }

    /// 在消息入队前，对 `Open` 之后的第一条消息做一次性的 WebSocket 升级请求头改写。
    ///
    /// # 设计背景（Why）
    /// - IoT Hub 的 WebSocket 传输路径要求客户端显式声明"不会出示客户端证书"，否则服务端会等待
    ///   一次永远不会发生的 TLS 客户端证书交换；上游实现在 `xio_impl.c` 里对每次 `open` 之后的
    ///   首条发送做字符串前缀匹配与插入，这里原样保留这条"业务逻辑"而不是把它泛化掉，因为它是
    ///   该协议握手的强制要求而非可选优化。
    ///
    /// # 逻辑解析（How）
    /// - `no_messages_yet_sent` 在 `open_async` 时置位，在本函数第一次被调用时无条件清除——不论
    ///   前缀是否匹配，"资格"只消耗一次；只有当清除前该标志为真、且缓冲区长度不短于前缀长度、且
    ///   确实以该前缀开头时才会分配新缓冲区并插入查询参数，其余情况原样透传。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：仅在 `send_async` 把消息放入队列之前调用一次；不会在重试或部分写场景下对
    ///   同一条消息重复调用。
    /// - **后置条件**：至多改写"进入 `Open` 之后的第一条"消息；所有后续消息，即便同样以该前缀
    ///   开头，也不再被改写。
    #[cfg(feature = "no-cert-header-rewrite")]
    fn prepare_outbound_bytes(&mut self, buffer: &[u8]) -> Box<[u8]> {
        if self.no_messages_yet_sent {
            self.no_messages_yet_sent = false;
            if buffer.len() >= WEBSOCKET_HEADER_START.len() && buffer.starts_with(WEBSOCKET_HEADER_START)
            {
                let mut rewritten =
                    Vec::with_capacity(buffer.len() + WEBSOCKET_HEADER_NO_CERT_PARAM.len());
                rewritten.extend_from_slice(WEBSOCKET_HEADER_START);
                rewritten.extend_from_slice(WEBSOCKET_HEADER_NO_CERT_PARAM);
                rewritten.extend_from_slice(&buffer[WEBSOCKET_HEADER_START.len()..]);
                tracing::debug!(target: "xio_core::engine", "rewrote outbound WebSocket upgrade header");
                return rewritten.into_boxed_slice();
            }
        }
        Box::from(buffer)
    }

    #[cfg(not(feature = "no-cert-header-rewrite"))]
    fn prepare_outbound_bytes(&mut self, buffer: &[u8]) -> Box<[u8]> {
        Box::from(buffer)
    }

    /// 将状态机推进一个节拍。
    ///
    /// # 设计背景（Why）
    /// - 整个引擎是轮询驱动的：没有内部线程、没有 waker，调用方（通常是一个外层事件循环）负责
    ///   按自己的节奏反复调用 `dowork`；这与上游 `xio_impl_dowork` 的职责完全一致，移植时保留了
    ///   "廉价、可重复调用、每次要么推进要么立即返回"这条约定。
    ///
    /// # 契约说明（What）
    /// - `Closed`/`Error` 两个状态下什么也不做；`Closing` 重试一次传输层关闭；`Opening` 轮询连接
    ///   建立；`Open` 依次推进接收泵与发送泵各一轮。调用方可以在任意状态下安全调用。
    pub fn dowork(&mut self) {
        match self.state {
            EngineState::Closed | EngineState::Error => {}
            EngineState::Closing => self.internal_close(),
            EngineState::Opening => self.dowork_poll_open(),
            EngineState::Open => {
                self.dowork_read();
                self.dowork_send();
            }
        }
    }

    fn dowork_poll_open(&mut self) {
        match self.transport.open(&self.config) {
            AsyncIoResult::Success => {
                self.state = EngineState::Open;
                tracing::info!(target: "xio_core::engine", "transport open completed");
                if let Some(cb) = self.on_open_complete.take() {
                    cb(OpenResult::Ok);
                }
            }
            AsyncIoResult::Waiting => {}
            AsyncIoResult::Failure => {
                tracing::error!(target: "xio_core::engine", "transport open failed");
                self.enter_open_error_state();
            }
        }
    }

    /// Mirrors the upstream `enter_open_error_state`: the open-complete
    /// callback is taken out *before* entering the error state (which may
    /// itself fire `on_io_error`), then invoked last with `OpenResult::Error`.
    fn enter_open_error_state(&mut self) {
        let on_open_complete = self.on_open_complete.take();
        self.enter_error();
        if let Some(cb) = on_open_complete {
            cb(OpenResult::Error);
        }
    }

    /// Idempotent transition into `ERROR`; `on_io_error` fires at most once
    /// per error condition regardless of how many times this is called.
    fn enter_error(&mut self) {
        if self.state != EngineState::Error {
            self.state = EngineState::Error;
            tracing::error!(target: "xio_core::engine", "engine entering ERROR state");
            if let Some(cb) = self.on_io_error.as_mut() {
                cb();
            }
        }
    }

    fn dowork_read(&mut self) {
        let mut buf = [0u8; RECEIVE_BUFFER_SIZE];
        loop {
            match self.transport.read(&mut buf) {
                TransportIoOutcome::Transferred(n) => {
                    debug_assert!(n > 0 && n <= buf.len());
                    if let Some(cb) = self.on_bytes_received.as_mut() {
                        cb(&buf[..n]);
                    }
                }
                TransportIoOutcome::WouldBlock => break,
                TransportIoOutcome::Failed => {
                    tracing::error!(target: "xio_core::engine", "transport read failed");
                    self.enter_error();
                    break;
                }
            }
        }
    }

    fn dowork_send(&mut self) {
        let Some(message) = self.queue.front_mut() else {
            return;
        };
        let outcome = self.transport.write(message.unsent());
        match outcome {
            TransportIoOutcome::Transferred(written) => {
                if message.advance(written) {
                    let message = self
                        .queue
                        .pop_front()
                        .expect("front message observed moments ago");
                    message.complete(SendResult::Ok);
                }
            }
            TransportIoOutcome::WouldBlock => {}
            TransportIoOutcome::Failed => {
                tracing::error!(target: "xio_core::engine", "transport write failed");
                if let Some(message) = self.queue.pop_front() {
                    message.complete(SendResult::Error);
                }
                self.enter_error();
            }
        }
    }

    /// Closes the transport once, drains the queue with `Cancelled`, and
    /// clears the callback set. Settles into `CLOSING` if the transport's
    /// close is still in flight, `CLOSED` otherwise.
    fn internal_close(&mut self) {
        let close_result = self.transport.close();
        self.queue.drain_cancel();
        self.on_bytes_received = None;
        self.on_io_error = None;
        self.state = match close_result {
            AsyncIoResult::Waiting => EngineState::Closing,
            AsyncIoResult::Success | AsyncIoResult::Failure => EngineState::Closed,
        };
        self.on_open_complete = None;
        tracing::debug!(target: "xio_core::engine", state = ?self.state, "internal_close completed");
    }

    pub fn set_option(&mut self, name: &str, value: OptionValue<'_>) -> Result<(), XioError> {
        self.config.set_option(name, value)
    }

    pub fn retrieve_options(&self) -> Option<<T::Config as EndpointConfig>::Options> {
        self.config.retrieve_options()
    }
}

impl<T: EndpointTransport> Drop for Engine<T> {
    fn drop(&mut self) {
        if self.state != EngineState::Closed {
            self.internal_close();
        }
    }
}

impl<T> XioEngine for Engine<T>
where
    T: EndpointTransport + 'static,
    <T::Config as EndpointConfig>::Options: 'static,
{
    fn state(&self) -> EngineState {
        Engine::state(self)
    }

    fn open_async_dyn(
        &mut self,
        on_open_complete: Box<dyn FnOnce(OpenResult) + Send>,
        on_bytes_received: Box<dyn FnMut(&[u8]) + Send>,
        on_io_error: Box<dyn FnMut() + Send>,
    ) -> Result<(), XioError> {
        self.open_async_boxed(on_open_complete, on_bytes_received, on_io_error)
    }

    fn close_async_dyn(
        &mut self,
        on_close_complete: Box<dyn FnOnce() + Send>,
    ) -> Result<(), XioError> {
        self.close_async_boxed(on_close_complete)
    }

    fn send_async_dyn(
        &mut self,
        buffer: &[u8],
        on_send_complete: Box<dyn FnOnce(SendResult) + Send>,
    ) -> Result<(), XioError> {
        self.send_async_boxed(buffer, on_send_complete)
    }

    fn dowork(&mut self) {
        Engine::dowork(self)
    }

    fn set_option(&mut self, name: &str, value: OptionValue<'_>) -> Result<(), XioError> {
        Engine::set_option(self, name, value)
    }

    fn retrieve_options_dyn(&self) -> Option<Box<dyn Any + Send>> {
        self.retrieve_options()
            .map(|opts| Box::new(opts) as Box<dyn Any + Send>)
    }
}
