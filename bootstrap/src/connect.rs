//! 客户端连接
//!
//! 只尝试一次，连上后包一层客户端日志拦截器

use guide_interceptor::{InterceptedService, InterceptorFactory, InterceptorLayer};
use tonic::transport::{Channel, Endpoint};
use tower::Layer;
use tracing::info;

use crate::error::BootstrapResult;

/// 连接服务端
pub async fn connect(endpoint: &str) -> BootstrapResult<Channel> {
    let endpoint = Endpoint::from_shared(endpoint.to_string())?;
    let channel = endpoint.connect().await?;
    info!(uri = %endpoint.uri(), "Connected");
    Ok(channel)
}

/// 连接服务端并安装客户端日志拦截器
pub async fn connect_intercepted(
    endpoint: &str,
    factory: InterceptorFactory,
) -> BootstrapResult<InterceptedService<Channel>> {
    let channel = connect(endpoint).await?;
    Ok(InterceptorLayer::caller(factory).layer(channel))
}
