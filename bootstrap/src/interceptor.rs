//! 日志拦截器装配

use std::sync::Arc;

use guide_config::{ExtractionFailureMode, InterceptorConfig};
use guide_interceptor::{
    ExtractionFailurePolicy, InterceptorFactory, InterceptorOptions, MethodSpec,
    MethodTypeRegistry, RecordSink, RenderStyle, TracingSink,
};
use tracing::info;

use crate::error::BootstrapResult;

/// 配置映射为拦截器选项
pub fn interceptor_options(config: &InterceptorConfig) -> InterceptorOptions {
    let failure_policy = match config.extraction_failure {
        ExtractionFailureMode::Abort => ExtractionFailurePolicy::Abort,
        ExtractionFailureMode::Mark => ExtractionFailurePolicy::MarkFailed,
    };
    let render_style = if config.pretty_json {
        RenderStyle::Pretty
    } else {
        RenderStyle::Compact
    };

    InterceptorOptions {
        failure_policy,
        render_style,
        ..InterceptorOptions::default()
    }
}

/// 构建注册表并校验服务暴露的方法全部已登记
pub fn build_interceptor_factory<'p>(
    config: &InterceptorConfig,
    inventory: impl IntoIterator<Item = MethodSpec>,
    exposed_paths: impl IntoIterator<Item = &'p str>,
    sink: Option<Arc<dyn RecordSink>>,
) -> BootstrapResult<InterceptorFactory> {
    let registry = MethodTypeRegistry::from_inventory(inventory)?;
    registry.validate(exposed_paths)?;
    info!(methods = registry.len(), "Method type registry built");

    let sink = sink.unwrap_or_else(|| Arc::new(TracingSink));
    Ok(InterceptorFactory::new(Arc::new(registry), sink).with_options(interceptor_options(config)))
}
