//! 输出记录与日志出口

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::batch::CallStatus;
use crate::phase::{CallDescriptor, HookPhase, Role};

/// 记录正文
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// 渲染后的消息
    Message(String),
    /// 渲染后的初始元数据
    Metadata(String),
    /// 流结束
    StreamEnded,
    /// 提取或渲染失败
    Failure(String),
    /// 状态记录，结果见 outcome / status_text
    Status,
}

impl fmt::Display for RecordBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(text) | Self::Metadata(text) => f.write_str(text),
            Self::StreamEnded => f.write_str("<stream ended>"),
            Self::Failure(reason) => write!(f, "<failed: {}>", reason),
            Self::Status => f.write_str("<status>"),
        }
    }
}

/// 每个激活的拦截点产生且只产生一条记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRecord {
    pub method: Arc<str>,
    pub role: Role,
    pub phase: HookPhase,
    /// 为空表示提取失败或调用终止
    pub type_name: Option<String>,
    pub body: RecordBody,
    pub outcome: Option<bool>,
    pub status_text: Option<String>,
}

impl RenderedRecord {
    fn new(call: &CallDescriptor, phase: HookPhase, type_name: Option<String>, body: RecordBody) -> Self {
        Self {
            method: call.method.clone(),
            role: call.role,
            phase,
            type_name,
            body,
            outcome: None,
            status_text: None,
        }
    }

    pub fn message(call: &CallDescriptor, phase: HookPhase, type_name: String, body: String) -> Self {
        Self::new(call, phase, Some(type_name), RecordBody::Message(body))
    }

    pub fn metadata(call: &CallDescriptor, body: String) -> Self {
        Self::new(
            call,
            HookPhase::PreSendInitialMetadata,
            None,
            RecordBody::Metadata(body),
        )
    }

    pub fn stream_ended(call: &CallDescriptor, phase: HookPhase) -> Self {
        Self::new(call, phase, None, RecordBody::StreamEnded)
    }

    pub fn failure(
        call: &CallDescriptor,
        phase: HookPhase,
        type_name: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(call, phase, type_name, RecordBody::Failure(reason.into()))
    }

    pub fn status(call: &CallDescriptor, phase: HookPhase, status: &CallStatus) -> Self {
        let mut record = Self::new(call, phase, None, RecordBody::Status);
        record.outcome = Some(status.is_ok());
        record.status_text = Some(status.text().to_string());
        record
    }

    /// 是否携带了一条消息
    pub fn is_message(&self) -> bool {
        matches!(self.body, RecordBody::Message(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.body, RecordBody::Failure(_))
    }
}

/// 日志出口，必须支持任意多个调用并发写入
pub trait RecordSink: Send + Sync {
    /// 输出一条记录，不重试
    fn emit(&self, record: &RenderedRecord);
}

/// 通过 tracing 输出，目标为 `rpc`
///
/// 级别过滤由订阅者决定，运行期修改级别不影响已构建好的记录
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, record: &RenderedRecord) {
        let type_name = record.type_name.as_deref().unwrap_or("-");
        match &record.body {
            RecordBody::Status => {
                let status_text = record.status_text.as_deref().unwrap_or_default();
                if record.outcome == Some(true) {
                    info!(
                        target: "rpc",
                        method = %record.method,
                        role = %record.role,
                        phase = %record.phase,
                        status = status_text,
                        "rpc status"
                    );
                } else {
                    warn!(
                        target: "rpc",
                        method = %record.method,
                        role = %record.role,
                        phase = %record.phase,
                        status = status_text,
                        "rpc status"
                    );
                }
            }
            RecordBody::Failure(reason) => {
                warn!(
                    target: "rpc",
                    method = %record.method,
                    role = %record.role,
                    phase = %record.phase,
                    type_name,
                    reason = %reason,
                    "rpc message not rendered"
                );
            }
            body => {
                info!(
                    target: "rpc",
                    method = %record.method,
                    role = %record.role,
                    phase = %record.phase,
                    type_name,
                    body = %body,
                    "rpc message"
                );
            }
        }
    }
}

/// 保存在内存中的记录，测试与诊断用
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<RenderedRecord>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<RenderedRecord> {
        self.lock().clone()
    }

    /// 取走并清空已有记录
    pub fn take(&self) -> Vec<RenderedRecord> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RenderedRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: &RenderedRecord) {
        self.lock().push(record.clone());
    }
}
