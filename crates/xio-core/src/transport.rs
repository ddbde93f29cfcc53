//! The Endpoint Transport Interface.
//!
//! An `EndpointTransport` is the opaque byte-stream endpoint the engine
//! drives: a TLS socket today, potentially something else tomorrow. The
//! engine only ever calls the five operations below and never inspects the
//! instance itself, matching the upstream `XIO_ENDPOINT_INTERFACE` vtable's
//! four-operation-plus-create shape.

use crate::config::EndpointConfig;

/// 传输端 `open`/`close` 单次尝试的结果。
///
/// # 契约说明（What）
/// - `Waiting` 意味着"再调用一次"，引擎会在下一次 `dowork` 时重新轮询，不视为失败；
/// - `Failure` 对 `open` 是本轮连接尝试的终态，对 `close` 则仍会让引擎落回 `CLOSED`
///   （设计说明第 7 节：关闭失败也视为连接已丢失）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncIoResult {
    /// The operation completed synchronously.
    Success,
    /// The operation is in flight; the engine should keep polling.
    Waiting,
    /// The operation failed outright.
    Failure,
}

/// 单次非阻塞 `read`/`write` 尝试的结果。
///
/// # 契约说明（What）
/// - 实现方绝不能用 `Transferred(0)` 表达"暂无数据/暂不可写"，必须使用 `WouldBlock`——
///   引擎的接收泵以 `WouldBlock` 作为循环退出信号，`Transferred(0)` 会被 `debug_assert!`
///   捕获为契约违反。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportIoOutcome {
    /// `n` bytes were transferred; `n` is always greater than zero.
    Transferred(usize),
    /// No bytes were available/acceptable right now; try again next tick.
    WouldBlock,
    /// The transport hit an unrecoverable error.
    Failed,
}

/// 可插入 I/O 引擎之下的字节流端点能力。
///
/// # 设计背景（Why）
/// - 上游 C 实现通过 `XIO_ENDPOINT_INTERFACE` 函数指针表在运行时绑定具体传输（当前仅 TLS，未来
///   可能是别的端点），引擎本身不关心背后究竟是 SecureTransport、OpenSSL 还是测试用的假端点。
/// - Rust 版本希望在不引入虚函数表开销、也不牺牲单元测试可替换性的前提下保留同样的解耦：泛型
///   trait 在单态化场景下零成本，又能在 `xio-tlsio-basic` 里被装箱为 `Box<dyn XioEngine>` 供调用方
///   使用。
///
/// # 逻辑解析（How）
/// - 实现方自行持有连接状态（socket、TLS 会话等），引擎只负责驱动其生命周期；`Self::Config` 把
///   某个传输家族与它能理解的配置类型在编译期绑定在一起。
/// - 引擎保证调用 `open`/`read`/`write` 前缀参数总是合法范围（`len`/`cap` 不超过内部约定的栈缓冲
///   区大小），实现方因此不需要重复做引擎已经做过的校验。
///
/// # 契约说明（What）
/// - **前置条件**：`open`/`close` 允许被重复调用直到返回非 `Waiting` 的终态；`read`/`write` 从不
///   阻塞，必须在当前没有数据/空间时返回 `WouldBlock` 而不是阻塞等待。
/// - **后置条件**：`create` 失败时返回 `None`，引擎将其映射为
///   [`crate::error::ErrorCategory::Allocation`] 而不是 panic。
///
/// # 设计取舍与风险（Trade-offs）
/// - 没有对"实现方在 `open` 返回 `Waiting` 之后必须保持幂等重试"做类型层面的强制，这部分契约只能
///   通过文档和契约测试（`xio-contract-tests`）覆盖，具体传输实现若违反会在集成测试中才能发现。
pub trait EndpointTransport: Send {
    /// 该传输家族能理解的配置类型——把"选项值对这个家族有意义"这一事实提升到类型系统里。
    type Config: EndpointConfig;

    /// 分配一个全新的、尚未打开的传输实例。
    ///
    /// # 契约说明（What）
    /// - 分配失败时返回 `None`；引擎会将其包装为
    ///   [`crate::error::ErrorCategory::Allocation`] 而不是向上传播 panic。
    fn create() -> Option<Self>
    where
        Self: Sized;

    /// 推进由 `config` 描述的连接建立过程。
    ///
    /// # 契约说明（What）
    /// - 可能同步完成，也可能返回 `Waiting` 要求引擎在下一次 `dowork` 时再次调用；`config` 由引擎
    ///   保证非空且与 `Self::Config` 同属一个传输家族。
    fn open(&mut self, config: &Self::Config) -> AsyncIoResult;

    /// 开始关闭连接，语义与 `open` 对称，同样可能返回 `Waiting`。
    fn close(&mut self) -> AsyncIoResult;

    /// 尝试读取到 `buf` 中，返回实际落地的字节数（如果有）。
    ///
    /// # 契约说明（What）
    /// - 绝不能用 `Transferred(0)` 表达"暂无数据"——必须使用 `WouldBlock`；接收泵依赖这一点判断何时
    ///   退出循环。
    fn read(&mut self, buf: &mut [u8]) -> TransportIoOutcome;

    /// 尝试写出 `buf`，返回被接受的字节数（如果有）。
    ///
    /// # 契约说明（What）
    /// - 部分写入是预期行为，由发送队列在后续 `dowork` 轮次中续写剩余字节，实现方不需要自行缓冲
    ///   未写完的部分。
    fn write(&mut self, buf: &[u8]) -> TransportIoOutcome;
}
