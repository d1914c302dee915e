//! 拦截器错误类型

use thiserror::Error;

use crate::phase::{HookPhase, Role};

/// 拦截器错误
#[derive(Debug, Error)]
pub enum InterceptError {
    /// 方法不在注册表中，属于配置/编程错误
    #[error("Method not registered: {0}")]
    Lookup(String),

    #[error("Malformed method path '{0}', expected /<service>/<method>")]
    InvalidMethod(String),

    #[error("Method registered twice: {0}")]
    DuplicateMethod(String),

    /// 回退路径反序列化失败
    #[error("Failed to decode {type_name} for {method} ({role}, {phase}): {source}")]
    Decode {
        method: String,
        role: Role,
        phase: HookPhase,
        type_name: String,
        #[source]
        source: prost::DecodeError,
    },

    /// 压缩帧，未解压无法还原消息
    #[error("Compressed payload of {len} bytes cannot be decoded")]
    Compressed { len: usize },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Hijack rejected: {0}")]
    HijackRejected(String),
}

impl InterceptError {
    pub fn lookup(method: impl Into<String>) -> Self {
        Self::Lookup(method.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn hijack_rejected(msg: impl Into<String>) -> Self {
        Self::HijackRejected(msg.into())
    }

    /// 是否为回退反序列化失败
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Result 类型别名
pub type InterceptResult<T> = Result<T, InterceptError>;
