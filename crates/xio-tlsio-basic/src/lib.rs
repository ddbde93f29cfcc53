//! The Basic-TLS Binder: glues a transport family's
//! [`EndpointTransport`](xio_core::EndpointTransport) vtable plus a
//! `{hostname, port, option_flags}` descriptor into the engine-shaped,
//! caller-facing [`XioEngine`](xio_core::XioEngine) trait object — the Rust
//! analogue of the upstream `tlsio_basic_get_interface_description`, whose
//! `create` entry built an engine around a bound transport and config and
//! whose remaining entries simply forwarded to the engine's own operations
//! (here, that forwarding is just calling through the `XioEngine` trait).

use xio_core::{
    Engine, EndpointConfig, EndpointTransport, ErrorCategory, OptionValue, XioEngine, XioError,
};

const MAX_VALID_PORT: u32 = 0xffff;

mod codes {
    pub const INVALID_HOSTNAME: &str = "binder.invalid_hostname";
    pub const INVALID_PORT: &str = "binder.invalid_port";
}

/// 调用方提供的 TLS 端点描述符，尚未校验。
///
/// # 契约说明（What）
/// - 传给 [`create_tls_engine`] 之后才会被校验并转换为 [`TlsConfigHandle`]；本结构体自身不保证
///   `hostname` 非空或 `port` 落在合法范围内。
pub struct TlsConfig {
    pub hostname: String,
    /// Not `u16` on purpose: callers may hand in an out-of-range value
    /// (e.g. parsed from untrusted config) that the binder must reject
    /// rather than silently truncate.
    pub port: u32,
    pub option_flags: u32,
}

/// Snapshot returned by `retrieve_options`.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub hostname: String,
    pub port: u16,
    pub option_flags: u32,
    pub extra: Vec<(String, i64)>,
}

/// 绑定到某一个 TLS 引擎实例上的已校验配置。实现 [`EndpointConfig`]，因此任何以
/// `Config = TlsConfigHandle` 为关联类型的传输家族都可以被 `xio-core` 的引擎驱动。
///
/// # 设计背景（Why）
/// - 上游 `xio_endpoint_config_tls.c` 在 `create` 时就完成主机名/端口校验，失败直接拒绝构造——
///   本类型复刻同一时点的校验策略：只能通过 [`Self::validated`] 构造，不存在"先构造、后校验"的
///   中间态，避免引擎拿到一个尚未校验的配置。
///
/// # 契约说明（What）
/// - **不变量**：一旦构造成功，`hostname` 非空且 `port` 落在 `u16` 范围内；`extra` 选项包只能
///   通过 `set_option` 以整数值追加或覆盖，不支持字符串/字节形状（参见 `set_option` 的拒绝分支）。
pub struct TlsConfigHandle {
    hostname: String,
    port: u16,
    option_flags: u32,
    extra: Vec<(String, i64)>,
}

impl TlsConfigHandle {
    fn validated(hostname: String, port: u32, option_flags: u32) -> Result<Self, XioError> {
        if hostname.is_empty() {
            tracing::error!(target: "xio_tlsio_basic", "TLS config rejected: empty hostname");
            return Err(XioError::new(
                codes::INVALID_HOSTNAME,
                ErrorCategory::Argument,
                "hostname must be non-empty",
            ));
        }
        if port > MAX_VALID_PORT {
            tracing::error!(target: "xio_tlsio_basic", port, "TLS config rejected: port out of range");
            return Err(XioError::new(
                codes::INVALID_PORT,
                ErrorCategory::Argument,
                "port must fit in 16 bits",
            ));
        }
        Ok(Self {
            hostname,
            port: port as u16,
            option_flags,
            extra: Vec::new(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn option_flags(&self) -> u32 {
        self.option_flags
    }
}

impl EndpointConfig for TlsConfigHandle {
    type Options = TlsOptions;

    fn set_option(&mut self, name: &str, value: OptionValue<'_>) -> Result<(), XioError> {
        match value {
            OptionValue::Int(v) => {
                if let Some(entry) = self.extra.iter_mut().find(|(k, _)| k == name) {
                    entry.1 = v;
                } else {
                    self.extra.push((name.to_string(), v));
                }
                Ok(())
            }
            _ => {
                tracing::error!(target: "xio_tlsio_basic", option = name, "unsupported TLS option value shape");
                Err(XioError::new(
                    "binder.unsupported_option_value",
                    ErrorCategory::Argument,
                    format!("TLS option {name:?} must be an integer value"),
                ))
            }
        }
    }

    fn retrieve_options(&self) -> Option<TlsOptions> {
        Some(TlsOptions {
            hostname: self.hostname.clone(),
            port: self.port,
            option_flags: self.option_flags,
            extra: self.extra.clone(),
        })
    }
}

/// 校验 `config` 并将传输家族 `T` 绑定到它上面，返回调用方可见的引擎描述符。
///
/// # 设计背景（Why）
/// - 对应上游 `tlsio_basic_get_interface_description` 的 `create` 入口；其余引擎操作（open/
///   close/send/dowork）在上游是直接转发到底层引擎的函数指针，这里则是调用方直接对返回的
///   `Box<dyn XioEngine>` 调用同名方法，不需要本 crate 再提供一层转发。
///
/// # 契约说明（What）
/// - **前置条件**：`config.hostname` 非空，`config.port` 落在 `0..=0xffff`；否则返回
///   [`ErrorCategory::Argument`] 且不分配传输实例。
/// - **后置条件**：成功时返回的引擎处于 `Closed` 状态，尚未发起连接。
pub fn create_tls_engine<T>(config: TlsConfig) -> Result<Box<dyn XioEngine>, XioError>
where
    T: EndpointTransport<Config = TlsConfigHandle> + 'static,
{
    let handle = TlsConfigHandle::validated(config.hostname, config.port, config.option_flags)?;
    let engine = Engine::<T>::create(handle)?;
    Ok(Box::new(engine))
}
