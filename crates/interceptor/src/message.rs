//! 消息的类型擦除视图
//!
//! 拦截器不关心具体的 protobuf 类型，只通过 [`ProtoMessage`] 读取类型名与 JSON 形式；
//! 回退路径需要可清空、可合并字节的实例，由 [`ScratchMessage`] 提供

use std::any::{Any, TypeId};
use std::fmt;

use serde::Serialize;

/// 可被注册表登记的消息类型
pub trait WireMessage: prost::Message + prost::Name + Serialize + Default + 'static {}

impl<T> WireMessage for T where T: prost::Message + prost::Name + Serialize + Default + 'static {}

/// 对象安全的消息视图
pub trait ProtoMessage: fmt::Debug + Send + Sync {
    /// 完整类型名，如 `routeguide.Point`
    fn type_name(&self) -> String;

    /// 序列化为 JSON 文本
    fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> ProtoMessage for T
where
    T: prost::Message + prost::Name + Serialize + 'static,
{
    fn type_name(&self) -> String {
        T::full_name()
    }

    fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 回退路径使用的暂存实例
pub trait ScratchMessage: ProtoMessage {
    /// 重置为空消息
    fn clear(&mut self);

    /// 把序列化字节合并进当前实例
    fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), prost::DecodeError>;

    fn as_proto(&self) -> &dyn ProtoMessage;
}

impl<T> ScratchMessage for T
where
    T: WireMessage,
{
    fn clear(&mut self) {
        prost::Message::clear(self)
    }

    fn merge_bytes(&mut self, bytes: &[u8]) -> Result<(), prost::DecodeError> {
        prost::Message::merge(self, bytes)
    }

    fn as_proto(&self) -> &dyn ProtoMessage {
        self
    }
}

fn new_scratch<T: WireMessage>() -> Box<dyn ScratchMessage> {
    Box::new(T::default())
}

/// 已解析的消息类型
#[derive(Clone)]
pub struct MessageDescriptor {
    type_id: TypeId,
    type_name: String,
    new_scratch: fn() -> Box<dyn ScratchMessage>,
}

impl MessageDescriptor {
    pub fn of<T: WireMessage>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::full_name(),
            new_scratch: new_scratch::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// 新建一个该类型的空实例
    pub fn new_scratch(&self) -> Box<dyn ScratchMessage> {
        (self.new_scratch)()
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor")
            .field(&self.type_name)
            .finish()
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}
