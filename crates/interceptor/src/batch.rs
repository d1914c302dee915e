//! RPC 运行时提供给拦截器的批次接口
//!
//! 每个批次可能同时激活多个拦截点，拦截器逐个查询，
//! 处理完后必须调用且只调用一次 [`HookBatch::proceed`] 或 [`HookBatch::hijack`]

use http::HeaderMap;

use crate::message::ProtoMessage;
use crate::phase::HookPhase;

/// 序列化后的消息字节
#[derive(Debug, Clone, Copy)]
pub struct SerializedMessage<'a> {
    pub bytes: &'a [u8],
    pub compressed: bool,
}

impl<'a> SerializedMessage<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            compressed: false,
        }
    }
}

/// 调用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStatus {
    pub code: tonic::Code,
    pub message: String,
}

impl CallStatus {
    /// 成功时记录中使用的状态文本
    pub const OK_TEXT: &'static str = "OK";

    pub fn new(code: tonic::Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(tonic::Code::Ok, "")
    }

    pub fn is_ok(&self) -> bool {
        self.code == tonic::Code::Ok
    }

    /// 成功时为 `OK`，失败时为错误信息
    pub fn text(&self) -> &str {
        if self.is_ok() {
            Self::OK_TEXT
        } else {
            &self.message
        }
    }
}

impl From<&tonic::Status> for CallStatus {
    fn from(status: &tonic::Status) -> Self {
        Self::new(status.code(), status.message())
    }
}

impl From<CallStatus> for tonic::Status {
    fn from(status: CallStatus) -> Self {
        tonic::Status::new(status.code, status.message)
    }
}

/// 一次批次求值
pub trait HookBatch {
    /// 本批次是否包含该拦截点
    fn is_active(&self, phase: HookPhase) -> bool;

    /// 即将发送的初始元数据
    fn initial_metadata(&self) -> Option<&HeaderMap>;

    /// 即将发送的结构化消息
    fn send_message(&self) -> Option<&dyn ProtoMessage>;

    /// 即将发送的序列化消息
    fn serialized_send_message(&self) -> Option<SerializedMessage<'_>>;

    /// 刚收到的结构化消息
    fn recv_message(&self) -> Option<&dyn ProtoMessage>;

    /// 刚收到的序列化消息
    fn serialized_recv_message(&self) -> Option<SerializedMessage<'_>>;

    /// 序列化字节是否直接来自对端且未经运行时校验
    ///
    /// 为 true 时回退反序列化失败只标记记录，不会交给致命错误处理
    fn bytes_from_peer(&self) -> bool {
        false
    }

    /// 服务端即将发送的状态
    fn send_status(&self) -> Option<&CallStatus>;

    /// 客户端收到的状态
    fn recv_status(&self) -> Option<&CallStatus>;

    /// 继续默认处理
    fn proceed(&mut self);

    /// 接管本批次，由拦截器负责完成
    fn hijack(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(CallStatus::ok().text(), "OK");
        let failed = CallStatus::new(tonic::Code::NotFound, "no such feature");
        assert!(!failed.is_ok());
        assert_eq!(failed.text(), "no such feature");
    }

    #[test]
    fn test_status_conversion() {
        let status = tonic::Status::invalid_argument("latitude out of range");
        let call_status = CallStatus::from(&status);
        assert_eq!(call_status.code, tonic::Code::InvalidArgument);

        let back: tonic::Status = call_status.into();
        assert_eq!(back.message(), "latitude out of range");
    }
}
