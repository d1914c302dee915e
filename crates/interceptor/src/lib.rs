//! gRPC 调用日志拦截器
//!
//! 在调用生命周期的各个拦截点上取出消息、渲染为 JSON 并输出一条记录。
//! 消息优先从运行时持有的结构化实例读取，拿不到时依据 [`MethodTypeRegistry`]
//! 把序列化字节解码到每个调用私有的暂存实例中。
//!
//! # 使用
//!
//! ```ignore
//! let registry = Arc::new(MethodTypeRegistry::from_inventory(method_inventory())?);
//! let factory = InterceptorFactory::new(registry, Arc::new(TracingSink));
//!
//! Server::builder()
//!     .layer(InterceptorLayer::callee(factory))
//!     .add_service(RouteGuideServer::new(service))
//!     .serve(addr)
//!     .await?;
//! ```

pub mod batch;
pub mod chain;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod factory;
pub mod message;
pub mod phase;
pub mod record;
pub mod registry;
pub mod render;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{CallStatus, HookBatch, SerializedMessage};
pub use chain::{ChainController, ChainDecision, HijackPolicy, NeverHijack};
pub use dispatcher::{
    ExtractionFailurePolicy, FatalHandler, HookPointDispatcher, InterceptorOptions, abort_process,
};
pub use error::{InterceptError, InterceptResult};
pub use extractor::{Direction, Extracted, MessageExtractor};
pub use factory::InterceptorFactory;
pub use message::{MessageDescriptor, ProtoMessage, WireMessage};
pub use phase::{CallDescriptor, Cardinality, HookPhase, Role};
pub use record::{MemorySink, RecordBody, RecordSink, RenderedRecord, TracingSink};
pub use registry::{MethodId, MethodSpec, MethodTypeRegistry};
pub use render::{RenderStyle, Renderer};
pub use transport::{InterceptedService, InterceptorLayer};
