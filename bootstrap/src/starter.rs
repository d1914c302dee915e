//! 服务启动器
//!
//! 所有 gRPC 服务都经由这里安装服务端日志拦截器并开始监听

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use guide_interceptor::{InterceptorFactory, InterceptorLayer};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::Body;
use tonic::server::NamedService;
use tonic::transport::Server;
use tower::Service;
use tracing::info;

use crate::error::{BootstrapError, BootstrapResult};

/// 绑定监听地址
pub async fn bind(addr: &str) -> BootstrapResult<TcpListener> {
    let addr: SocketAddr = addr.parse().map_err(|e: std::net::AddrParseError| {
        BootstrapError::Addr {
            addr: addr.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(TcpListener::bind(addr).await?)
}

/// 在已绑定的监听器上运行 gRPC 服务，`shutdown` 完成后优雅退出
///
/// # 示例
///
/// ```ignore
/// let listener = bind(&config.server_addr()).await?;
/// serve(RouteGuideServer::new(service), factory, listener, shutdown_signal()).await?;
/// ```
pub async fn serve<S, F>(
    service: S,
    factory: InterceptorFactory,
    listener: TcpListener,
    shutdown: F,
) -> BootstrapResult<()>
where
    S: Service<http::Request<Body>, Response = http::Response<Body>, Error = Infallible>
        + NamedService
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    info!(%addr, service = S::NAME, "gRPC server starting");

    Server::builder()
        .layer(InterceptorLayer::callee(factory))
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("Service stopped");
    Ok(())
}
