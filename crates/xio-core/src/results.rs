//! Outcome types surfaced to callback consumers.

/// `on_open_complete` 的交付结果。
///
/// # 契约说明（What）
/// - 每次 `open_async` 成功返回后，`on_open_complete` 必须恰好触发一次，取值三选一：
///   `Ok`（传输层报告连接建立成功）、`Error`（传输层报告失败，引擎随后落入 `ERROR`）、
///   `Cancelled`（在 `OPENING` 期间被 `close_async` 取消，严格先于内部状态变更触发）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenResult {
    Ok,
    Error,
    /// The open was in flight when `close_async` was called.
    Cancelled,
}

/// 一条待发送消息的发送完成回调所交付的结果。
///
/// # 契约说明（What）
/// - `Ok`：消息已完整写出；`Error`：写入过程中传输层报错，引擎同时落入 `ERROR`；`Cancelled`：消息
///   在仍排队时引擎被关闭。三者互斥，且每条经 `send_async` 成功入队的消息最终恰好收到其中一个。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    Ok,
    Error,
    /// The message was still queued when the engine closed.
    Cancelled,
}
