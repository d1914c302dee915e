//! 传输层构造的批次
//!
//! 传输层只看得到帧字节，不持有结构化消息，提取总是走回退路径

use http::HeaderMap;

use crate::batch::{CallStatus, HookBatch, SerializedMessage};
use crate::message::ProtoMessage;
use crate::phase::HookPhase;

#[derive(Debug, Default)]
pub struct TransportBatch<'a> {
    phases: Vec<HookPhase>,
    metadata: Option<&'a HeaderMap>,
    send: Option<SerializedMessage<'a>>,
    recv: Option<SerializedMessage<'a>>,
    send_status: Option<CallStatus>,
    recv_status: Option<CallStatus>,
    hijacked: bool,
}

impl<'a> TransportBatch<'a> {
    pub fn new(phases: &[HookPhase]) -> Self {
        Self {
            phases: phases.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, headers: &'a HeaderMap) -> Self {
        self.metadata = Some(headers);
        self
    }

    pub fn with_send(mut self, message: SerializedMessage<'a>) -> Self {
        self.send = Some(message);
        self
    }

    pub fn with_recv(mut self, message: SerializedMessage<'a>) -> Self {
        self.recv = Some(message);
        self
    }

    pub fn with_send_status(mut self, status: CallStatus) -> Self {
        self.send_status = Some(status);
        self
    }

    pub fn with_recv_status(mut self, status: CallStatus) -> Self {
        self.recv_status = Some(status);
        self
    }

    pub fn is_hijacked(&self) -> bool {
        self.hijacked
    }
}

impl HookBatch for TransportBatch<'_> {
    fn is_active(&self, phase: HookPhase) -> bool {
        self.phases.contains(&phase)
    }

    fn initial_metadata(&self) -> Option<&HeaderMap> {
        self.metadata
    }

    fn send_message(&self) -> Option<&dyn ProtoMessage> {
        None
    }

    fn serialized_send_message(&self) -> Option<SerializedMessage<'_>> {
        self.send
    }

    fn recv_message(&self) -> Option<&dyn ProtoMessage> {
        None
    }

    fn serialized_recv_message(&self) -> Option<SerializedMessage<'_>> {
        self.recv
    }

    /// 收到的帧来自对端；发出的帧由本侧运行时编码
    fn bytes_from_peer(&self) -> bool {
        self.recv.is_some()
    }

    fn send_status(&self) -> Option<&CallStatus> {
        self.send_status.as_ref()
    }

    fn recv_status(&self) -> Option<&CallStatus> {
        self.recv_status.as_ref()
    }

    fn proceed(&mut self) {}

    fn hijack(&mut self) {
        self.hijacked = true;
    }
}
