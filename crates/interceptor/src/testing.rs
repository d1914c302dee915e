//! 单元测试共用的消息类型与批次桩

use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::batch::{CallStatus, HookBatch, SerializedMessage};
use crate::message::ProtoMessage;
use crate::phase::{CallDescriptor, HookPhase, Role};
use crate::registry::{MethodSpec, MethodTypeRegistry};

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ping {
    #[prost(int32, tag = "1")]
    pub seq: i32,
    #[prost(string, tag = "2")]
    pub text: String,
}

impl prost::Name for Ping {
    const NAME: &'static str = "Ping";
    const PACKAGE: &'static str = "guide.test";
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Envelope {
    #[prost(message, optional, tag = "1")]
    pub ping: Option<Ping>,
    #[prost(string, tag = "2")]
    pub label: String,
}

impl prost::Name for Envelope {
    const NAME: &'static str = "Envelope";
    const PACKAGE: &'static str = "guide.test";
}

/// JSON 序列化总是失败的消息
#[derive(Clone, PartialEq, prost::Message)]
pub struct Faulty {
    #[prost(int32, tag = "1")]
    pub value: i32,
}

impl prost::Name for Faulty {
    const NAME: &'static str = "Faulty";
    const PACKAGE: &'static str = "guide.test";
}

impl Serialize for Faulty {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("unrenderable field"))
    }
}

pub fn test_registry() -> MethodTypeRegistry {
    MethodTypeRegistry::from_inventory([
        MethodSpec::unary::<Ping, Envelope>("/guide.test.Echo/Wrap"),
        MethodSpec::unary::<Ping, Ping>("/guide.test.Echo/Ping"),
        MethodSpec::bidi_streaming::<Ping, Ping>("/guide.test.Echo/Stream"),
        MethodSpec::server_streaming::<Ping, Envelope>("/guide.test.Echo/Subscribe"),
    ])
    .unwrap()
}

pub fn call(registry: &MethodTypeRegistry, path: &str, role: Role) -> CallDescriptor {
    let method_id = registry.lookup(path).unwrap();
    CallDescriptor {
        method: registry.path(method_id).clone(),
        method_id,
        role,
        cardinality: registry.cardinality(method_id),
    }
}

/// 按脚本构造的批次，记录收到的调用控制决定
#[derive(Default)]
pub struct ScriptedBatch {
    phases: Vec<HookPhase>,
    metadata: Option<HeaderMap>,
    send: Option<Box<dyn ProtoMessage>>,
    send_bytes: Option<Vec<u8>>,
    recv: Option<Box<dyn ProtoMessage>>,
    recv_bytes: Option<Vec<u8>>,
    compressed: bool,
    from_peer: bool,
    send_status: Option<CallStatus>,
    recv_status: Option<CallStatus>,
    pub decisions: Vec<&'static str>,
}

impl ScriptedBatch {
    pub fn new(phases: &[HookPhase]) -> Self {
        Self {
            phases: phases.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, headers: HeaderMap) -> Self {
        self.metadata = Some(headers);
        self
    }

    pub fn with_send(mut self, message: impl ProtoMessage + 'static) -> Self {
        self.send = Some(Box::new(message));
        self
    }

    pub fn with_send_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.send_bytes = Some(bytes);
        self
    }

    pub fn with_recv(mut self, message: impl ProtoMessage + 'static) -> Self {
        self.recv = Some(Box::new(message));
        self
    }

    pub fn with_recv_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.recv_bytes = Some(bytes);
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn from_peer(mut self) -> Self {
        self.from_peer = true;
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
}

impl HookBatch for ScriptedBatch {
    fn is_active(&self, phase: HookPhase) -> bool {
        self.phases.contains(&phase)
    }

    fn initial_metadata(&self) -> Option<&HeaderMap> {
        self.metadata.as_ref()
    }

    fn send_message(&self) -> Option<&dyn ProtoMessage> {
        self.send.as_deref()
    }

    fn serialized_send_message(&self) -> Option<SerializedMessage<'_>> {
        self.send_bytes.as_deref().map(|bytes| SerializedMessage {
            bytes,
            compressed: self.compressed,
        })
    }

    fn recv_message(&self) -> Option<&dyn ProtoMessage> {
        self.recv.as_deref()
    }

    fn serialized_recv_message(&self) -> Option<SerializedMessage<'_>> {
        self.recv_bytes.as_deref().map(|bytes| SerializedMessage {
            bytes,
            compressed: self.compressed,
        })
    }

    fn bytes_from_peer(&self) -> bool {
        self.from_peer
    }

    fn send_status(&self) -> Option<&CallStatus> {
        self.send_status.as_ref()
    }

    fn recv_status(&self) -> Option<&CallStatus> {
        self.recv_status.as_ref()
    }

    fn proceed(&mut self) {
        self.decisions.push("proceed");
    }

    fn hijack(&mut self) {
        self.decisions.push("hijack");
    }
}

