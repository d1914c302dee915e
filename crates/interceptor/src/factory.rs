//! 拦截器工厂，每个调用创建一个独立的分发器

use std::sync::Arc;

use crate::chain::{HijackPolicy, NeverHijack};
use crate::dispatcher::{HookPointDispatcher, InterceptorOptions};
use crate::error::InterceptResult;
use crate::extractor::MessageExtractor;
use crate::phase::{CallDescriptor, Role};
use crate::record::RecordSink;
use crate::registry::MethodTypeRegistry;

#[derive(Clone)]
pub struct InterceptorFactory {
    registry: Arc<MethodTypeRegistry>,
    sink: Arc<dyn RecordSink>,
    hijack_policy: Arc<dyn HijackPolicy>,
    options: InterceptorOptions,
}

impl InterceptorFactory {
    pub fn new(registry: Arc<MethodTypeRegistry>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            registry,
            sink,
            hijack_policy: Arc::new(NeverHijack),
            options: InterceptorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InterceptorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hijack_policy(mut self, policy: Arc<dyn HijackPolicy>) -> Self {
        self.hijack_policy = policy;
        self
    }

    pub fn registry(&self) -> &Arc<MethodTypeRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &InterceptorOptions {
        &self.options
    }

    /// 为一次调用创建分发器，方法未登记时返回 Lookup 错误
    pub fn create(&self, method: &str, role: Role) -> InterceptResult<HookPointDispatcher> {
        let method_id = self.registry.lookup(method)?;
        let call = CallDescriptor {
            method: self.registry.path(method_id).clone(),
            method_id,
            role,
            cardinality: self.registry.cardinality(method_id),
        };

        Ok(HookPointDispatcher::new(
            call,
            MessageExtractor::new(self.registry.clone()),
            self.sink.clone(),
            self.hijack_policy.clone(),
            self.options,
        ))
    }
}
