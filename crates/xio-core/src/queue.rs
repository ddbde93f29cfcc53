//! The Transmission Queue: a FIFO of outbound messages awaiting the
//! transport's write pump, supporting partial-write resumption.

use alloc::boxed::Box;
use alloc::collections::VecDeque;

use crate::results::SendResult;

/// 一条待发送消息。`unsent_size` 初始等于缓冲区长度，随着发送泵推进单调递减；缓冲区尾部
/// `[len - unsent_size..]` 始终是还欠传输层的部分。
///
/// # 设计背景（Why）
/// - 上游 `PENDING_TRANSMISSION` 结构体用 `size`/`unsent_size` 两个字段表达"已发送前缀 + 未发送
///   尾部"，本结构体保留同样的双字段表达，而不是每次发送后截断/重新分配缓冲区——分区间写满一次
///   才释放堆内存，避免了部分写场景下的重复分配。
///
/// # 契约说明（What）
/// - **不变量**：`unsent_size` 永远不超过 `bytes.len()`；`unsent()` 返回的切片永远是缓冲区的一个
///   后缀。
pub(crate) struct PendingMessage {
    bytes: Box<[u8]>,
    unsent_size: usize,
    on_send_complete: Box<dyn FnOnce(SendResult) + Send>,
}

impl PendingMessage {
    pub(crate) fn new(
        bytes: Box<[u8]>,
        on_send_complete: Box<dyn FnOnce(SendResult) + Send>,
    ) -> Self {
        let unsent_size = bytes.len();
        Self {
            bytes,
            unsent_size,
            on_send_complete,
        }
    }

    /// The bytes still owed to the transport.
    pub(crate) fn unsent(&self) -> &[u8] {
        let start = self.bytes.len() - self.unsent_size;
        &self.bytes[start..]
    }

    /// Records that `written` bytes of the unsent tail were accepted by the
    /// transport. Returns `true` once the whole message has been sent.
    pub(crate) fn advance(&mut self, written: usize) -> bool {
        debug_assert!(written <= self.unsent_size);
        self.unsent_size -= written;
        self.unsent_size == 0
    }

    pub(crate) fn complete(self, result: SendResult) {
        (self.on_send_complete)(result);
    }
}

/// 等待发送的消息构成的 FIFO 队列。
///
/// # 设计背景（Why）
/// - 上游实现使用 `SINGLYLINKEDLIST_HANDLE` 手写单链表；这里换成 `alloc::collections::VecDeque`，
///   因为本队列只需要"队尾入队、队首出队/原地修改"两类操作，标准双端队列足以满足，没有理由重新
///   实现链表结构。
///
/// # 契约说明（What）
/// - 队列只在 `OPEN` 状态或 `CLOSING` 排空期间非空；`drain_cancel` 是唯一会在队列非空时把引擎状态
///   与队列内容一起清空的入口。
#[derive(Default)]
pub(crate) struct TransmissionQueue {
    messages: VecDeque<PendingMessage>,
}

impl TransmissionQueue {
    pub(crate) fn new() -> Self {
        Self {
            messages: VecDeque::new(),
        }
    }

    pub(crate) fn push_back(&mut self, message: PendingMessage) {
        self.messages.push_back(message);
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut PendingMessage> {
        self.messages.front_mut()
    }

    pub(crate) fn pop_front(&mut self) -> Option<PendingMessage> {
        self.messages.pop_front()
    }

    /// Drains every queued message, firing each one's callback with
    /// `SendResult::Cancelled`. Used when the engine closes with messages
    /// still outstanding.
    pub(crate) fn drain_cancel(&mut self) {
        while let Some(message) = self.pop_front() {
            message.complete(SendResult::Cancelled);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}
