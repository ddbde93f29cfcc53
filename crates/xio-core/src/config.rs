//! The Endpoint Configuration Interface.
//!
//! A transport family's configuration is opaque to the engine; it only
//! forwards `set_option`/`retrieve_options` calls to whichever
//! `EndpointConfig` the caller constructed (e.g. `xio-tlsio-basic`'s TLS
//! option bag).

/// 单个选项值，对应上游 C `xio_setoption` 所接受的 `const void*`，收窄为传输配置实际需要的几种
/// 形状。
///
/// # 设计取舍与风险（Trade-offs）
/// - 用封闭的枚举取代 `void*`，放弃了"任意类型都能塞进去"的灵活性，换来的是 `set_option` 的实现方
///   可以用 `match` 穷尽处理而不必做不安全的指针转换；若未来需要新的形状（例如嵌套选项包），应在
///   这里新增枚举分支而不是退回到类型擦除。
#[derive(Debug, Clone, Copy)]
pub enum OptionValue<'a> {
    Bool(bool),
    Int(i64),
    Str(&'a str),
    Bytes(&'a [u8]),
}

/// 一个传输家族的配置包。
///
/// # 设计背景（Why）
/// - 上游实现里，配置句柄是不透明的 `XIO_ENDPOINT_CONFIG_HANDLE`，引擎完全不解释其内容，只是转发
///   `set_option`/`retrieve_options` 调用；Rust 版本用关联类型 `Options` 复刻同样的不透明性，同时
///   让"这个配置属于哪个传输家族"在编译期可检查（`EndpointTransport::Config` 与这里的实现必须
///   匹配）。
///
/// # 契约说明（What）
/// - `Options` 是 `retrieve_options` 交还给调用方的不透明句柄——引擎只负责转发，从不查看其内部；
/// - `set_option` 对未知选项名或形状不匹配的值返回错误，而不是静默忽略。
pub trait EndpointConfig: Send {
    type Options: Send;

    /// 应用一个具名选项。
    ///
    /// # 契约说明（What）
    /// - 选项名未知或值的形状与该选项期望的不符时返回错误；成功时不产生任何可观察的副作用之外的
    ///   状态变化。
    fn set_option(
        &mut self,
        name: &str,
        value: OptionValue<'_>,
    ) -> Result<(), crate::error::XioError>;

    /// 如果该传输家族支持导出已配置的选项（例如克隆配置到一个新引擎），返回当前快照。
    fn retrieve_options(&self) -> Option<Self::Options>;
}
