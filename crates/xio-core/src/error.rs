//! Crate-wide structured error type.
//!
//! Every `FAILURE` sentinel in the upstream C contract is backed here by a
//! single flat [`XioError`]: a stable code, a human message, an optional
//! cause, and an [`ErrorCategory`] drawn from the taxonomy the design notes
//! describe. Public engine methods that the C API expressed as `int` return
//! codes return `Result<_, XioError>` instead — a caller that only checks
//! `.is_err()` observes exactly the same FAILURE/success boundary.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// 粗粒度故障分类，对应设计说明中错误处理一节的分类表。
///
/// # 设计背景（Why）
/// - 上游 C 实现在每个早退分支都手写 `LogError` + `result = MU_FAILURE`，调用方无从区分“参数错误”与
///   “传输失败”；这里把隐含的分类显式提升为类型，方便调用方按类别决定重试策略。
/// - 该分类直接决定哪个回调（如果有）会被触发，以及是否伴随状态迁移——二者都是契约的一部分，不是
///   附加信息。
///
/// # 契约说明（What）
/// - `Argument`/`Precondition` 两类错误不产生状态迁移，也不触发任何回调；
/// - `Allocation` 仅出现在 `create`/`send_async` 的分配失败路径；
/// - `Transport` 对应端点 `open`/`read`/`write`/`close` 报告的失败，总是伴随进入 `ERROR` 状态；
/// - `Internal` 预留给本 crate 自身的不变量被破坏的情形，正常运行路径不应触发。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A caller-supplied argument was null, empty, or out of range.
    Argument,
    /// The call was made from a lifecycle state that forbids it.
    Precondition,
    /// Heap allocation for the engine, queue entry, or config bag failed.
    Allocation,
    /// The endpoint transport reported open/read/write/close failure.
    Transport,
    /// An invariant internal to this crate was violated.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCategory::Argument => "argument",
            ErrorCategory::Precondition => "precondition",
            ErrorCategory::Allocation => "allocation",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(text)
    }
}

/// `XioError` 是本 crate 所有可失败操作（引擎、队列、绑定器）最终汇聚到的统一错误形态。
///
/// # 设计背景（Why）
/// - 上游契约里每一个 `FAILURE` 哨兵值背后都有不同的失败原因，但调用方只关心“失败与否”与“能否重试”；
///   把它们合流为单一结构体，日志与上层重试策略可以统一处理而不必为每个错误站点单独建模。
/// - 目标环境包含 `no_std + alloc`，因此不能依赖 `std::error::Error` 的阻塞假设，但仍希望兼容
///   `core::error::Error`，便于嵌入更大的错误链路。
///
/// # 逻辑解析（How）
/// - 字段以值语义持有：稳定的 `&'static str` 错误码、供排障阅读的 `message`、驱动分支逻辑的
///   `ErrorCategory`，以及可选的 `cause`，用装箱的 trait 对象承载下层错误而不引入泛型参数。
/// - 构造从 `new` 开始，不带任何底层原因；需要时通过 [`with_cause`](Self::with_cause) 叠加，
///   这样绝大多数调用点（参数校验、状态校验）都不必为一个不存在的原因分配内存。
///
/// # 契约说明（What）
/// - **前置条件**：`code` 必须是 `<area>.<reason>` 形式的稳定字符串，建议取自 [`codes`] 模块。
/// - **后置条件**：返回的 `XioError` 可安全跨线程传递（`Send + Sync`），`category()` 的取值必须与
///   触发该错误的失败点在设计说明第 7 节中列出的分类一致。
///
/// # 设计取舍与风险（Trade-offs）
/// - 用一个扁平结构体代替分错误类型的枚举，牺牲了"按变体穷尽匹配"的编译期检查，换来调用方只需学习
///   一种错误形状；如果未来需要为特定类别附加专属字段，应在 `ErrorCategory` 之外单独扩展，而不是
///   拆分 `XioError` 本身。
pub struct XioError {
    code: &'static str,
    message: String,
    category: ErrorCategory,
    cause: Option<Box<dyn core::error::Error + Send + Sync>>,
}

impl XioError {
    /// 构造一个不带底层原因的错误。
    ///
    /// # 契约说明（What）
    /// - `code` 应取自调用点所属模块的 `codes` 常量，`category` 必须反映触发该错误的失败类别，
    ///   二者共同决定回调/状态迁移语义；`message` 面向排障人员，不应包含敏感信息。
    pub fn new(code: &'static str, category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            category,
            cause: None,
        }
    }

    /// 为已有错误附加一个装箱的底层原因，返回增强后的值。
    ///
    /// # 使用场景（How）
    /// - 当下层（例如某个具体传输实现自身的错误类型）需要在不引入泛型参数的前提下保留在
    ///   `XioError` 的 `source()` 链路中时使用；调用方通常紧跟 `new` 链式调用。
    pub fn with_cause(
        mut self,
        cause: impl core::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn cause(&self) -> Option<&(dyn core::error::Error + Send + Sync)> {
        self.cause.as_deref()
    }
}

impl fmt::Debug for XioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XioError")
            .field("code", &self.code)
            .field("category", &self.category)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for XioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl core::error::Error for XioError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn core::error::Error + 'static))
    }
}

/// 稳定错误码，按 `<area>.<reason>` 命名，对应设计说明中的约定。
///
/// # 设计取舍与风险（Trade-offs）
/// - 以字符串常量的扁平模块表达，而非枚举：新增错误码不需要在调用方强制穷尽匹配，代价是编译期
///   无法保证某个 `&'static str` 一定来自本模块——这与 `XioError::new` 对 `code` 的约定一致，
///   属于有意识的取舍。
pub mod codes {
    pub const ENGINE_NULL_ARGUMENT: &str = "engine.null_argument";
    pub const ENGINE_INVALID_STATE: &str = "engine.invalid_state";
    pub const ENGINE_SEND_SIZE: &str = "engine.send_size";
    pub const TRANSPORT_CREATE_FAILED: &str = "transport.create_failed";
    pub const TRANSPORT_OPEN_FAILED: &str = "transport.open_failed";
    pub const TRANSPORT_CLOSE_FAILED: &str = "transport.close_failed";
    pub const CONFIG_SET_OPTION: &str = "config.set_option";
    pub const BINDER_INVALID_HOSTNAME: &str = "binder.invalid_hostname";
    pub const BINDER_INVALID_PORT: &str = "binder.invalid_port";
}
