//! 消息提取
//!
//! 优先取运行时已经持有的结构化消息；取不到时按注册表解析类型，
//! 把序列化字节反序列化到本次调用私有的暂存实例中

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::batch::HookBatch;
use crate::error::{InterceptError, InterceptResult};
use crate::message::{MessageDescriptor, ProtoMessage, ScratchMessage};
use crate::phase::{CallDescriptor, HookPhase};
use crate::registry::MethodTypeRegistry;

/// 消息方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

impl Direction {
    pub fn phase(&self) -> HookPhase {
        match self {
            Self::Send => HookPhase::PreSendMessage,
            Self::Recv => HookPhase::PostRecvMessage,
        }
    }
}

/// 提取结果
#[derive(Debug)]
pub enum Extracted<'a> {
    /// 运行时持有的消息，零拷贝
    Structured(&'a dyn ProtoMessage),
    /// 由序列化字节还原
    Decoded(&'a dyn ProtoMessage),
    /// 拦截点激活但没有消息，即流结束
    Empty,
}

impl<'a> Extracted<'a> {
    pub fn message(&self) -> Option<&'a dyn ProtoMessage> {
        match self {
            Self::Structured(msg) | Self::Decoded(msg) => Some(*msg),
            Self::Empty => None,
        }
    }
}

/// 按类型复用的暂存实例，首次使用时分配
#[derive(Default)]
struct ScratchPool {
    slots: HashMap<TypeId, Box<dyn ScratchMessage>>,
}

impl ScratchPool {
    /// 取出该类型的实例，返回前已清空
    fn checkout(&mut self, descriptor: &MessageDescriptor) -> &mut dyn ScratchMessage {
        let slot = self
            .slots
            .entry(descriptor.type_id())
            .or_insert_with(|| descriptor.new_scratch());
        slot.clear();
        slot.as_mut()
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// 单次调用私有的消息提取器
pub struct MessageExtractor {
    registry: Arc<MethodTypeRegistry>,
    pool: ScratchPool,
}

impl MessageExtractor {
    pub fn new(registry: Arc<MethodTypeRegistry>) -> Self {
        Self {
            registry,
            pool: ScratchPool::default(),
        }
    }

    pub fn extract<'a, B>(
        &'a mut self,
        direction: Direction,
        batch: &'a B,
        call: &CallDescriptor,
    ) -> InterceptResult<Extracted<'a>>
    where
        B: HookBatch + ?Sized,
    {
        let (live, serialized) = match direction {
            Direction::Send => (batch.send_message(), batch.serialized_send_message()),
            Direction::Recv => (batch.recv_message(), batch.serialized_recv_message()),
        };

        if let Some(message) = live {
            return Ok(Extracted::Structured(message));
        }

        let Some(serialized) = serialized else {
            return Ok(Extracted::Empty);
        };

        if serialized.compressed {
            return Err(InterceptError::Compressed {
                len: serialized.bytes.len(),
            });
        }

        let types = self.registry.types(call.method_id, call.role);
        let descriptor = match direction {
            Direction::Send => types.send(),
            Direction::Recv => types.recv(),
        };

        let scratch = self.pool.checkout(descriptor);
        scratch
            .merge_bytes(serialized.bytes)
            .map_err(|source| InterceptError::Decode {
                method: call.method.to_string(),
                role: call.role,
                phase: direction.phase(),
                type_name: descriptor.type_name().to_string(),
                source,
            })?;

        Ok(Extracted::Decoded(scratch.as_proto()))
    }

    /// 已分配的暂存实例数量
    pub fn scratch_count(&self) -> usize {
        self.pool.len()
    }
}
