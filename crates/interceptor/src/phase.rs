//! 调用描述与拦截点

use std::fmt;
use std::sync::Arc;

use crate::registry::MethodId;

/// 拦截器所在的一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// 客户端
    Caller,
    /// 服务端
    Callee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Caller => "caller",
            Self::Callee => "callee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 流式基数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Unary,
    ClientStreaming,
    ServerStreaming,
    BidiStreaming,
}

impl Cardinality {
    pub fn client_streams(&self) -> bool {
        matches!(self, Self::ClientStreaming | Self::BidiStreaming)
    }

    pub fn server_streams(&self) -> bool {
        matches!(self, Self::ServerStreaming | Self::BidiStreaming)
    }

    /// `role` 一侧接收方向是否为流
    pub fn streams_recv(&self, role: Role) -> bool {
        match role {
            Role::Caller => self.server_streams(),
            Role::Callee => self.client_streams(),
        }
    }

    /// `role` 一侧发送方向是否为流
    pub fn streams_send(&self, role: Role) -> bool {
        match role {
            Role::Caller => self.client_streams(),
            Role::Callee => self.server_streams(),
        }
    }
}

/// 调用生命周期中的拦截点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    PreSendInitialMetadata,
    PreSendMessage,
    PostRecvMessage,
    /// 仅服务端
    PreSendStatus,
    /// 仅客户端
    PostRecvStatus,
}

impl HookPhase {
    /// 一个批次内的求值顺序
    pub const ALL: [HookPhase; 5] = [
        HookPhase::PreSendInitialMetadata,
        HookPhase::PreSendMessage,
        HookPhase::PostRecvMessage,
        HookPhase::PreSendStatus,
        HookPhase::PostRecvStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreSendInitialMetadata => "PRE_SEND_INITIAL_METADATA",
            Self::PreSendMessage => "PRE_SEND_MESSAGE",
            Self::PostRecvMessage => "POST_RECV_MESSAGE",
            Self::PreSendStatus => "PRE_SEND_STATUS",
            Self::PostRecvStatus => "POST_RECV_STATUS",
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::PreSendStatus | Self::PostRecvStatus)
    }

    /// 该拦截点只会出现在哪一侧，两侧都可能出现时返回 None
    pub fn only_for(&self) -> Option<Role> {
        match self {
            Self::PreSendStatus => Some(Role::Callee),
            Self::PostRecvStatus => Some(Role::Caller),
            _ => None,
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次调用的不可变描述，调用建立时创建
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub method: Arc<str>,
    pub method_id: MethodId,
    pub role: Role,
    pub cardinality: Cardinality,
}
