//! 把拦截器接到 tonic 的传输层
//!
//! [`InterceptorLayer`] 是一个 tower Layer，客户端包在 Channel 外面，
//! 服务端通过 `Server::builder().layer(..)` 安装。请求头、帧、trailers
//! 依次转成批次交给每个调用自己的 [`HookPointDispatcher`]

mod batch;
mod body;
mod frame;

use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response};
use tonic::body::Body;
use tower::{Layer, Service};
use tracing::{error, warn};

pub use batch::TransportBatch;
pub use body::{Flow, MISSING_STATUS_TEXT, ObservedBody};
pub use frame::{FrameDecoder, GrpcFrame, HEADER_LEN, encode_frame};

use body::{final_phases, status_from_headers};

use crate::batch::CallStatus;
use crate::chain::ChainDecision;
use crate::dispatcher::HookPointDispatcher;
use crate::factory::InterceptorFactory;
use crate::phase::{HookPhase, Role};

/// 同一调用的请求与响应 body 共享的分发器
pub type SharedCall = Arc<Mutex<HookPointDispatcher>>;

pub(crate) fn lock(call: &SharedCall) -> MutexGuard<'_, HookPointDispatcher> {
    call.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct InterceptorLayer {
    factory: InterceptorFactory,
    role: Role,
}

impl InterceptorLayer {
    /// 客户端拦截
    pub fn caller(factory: InterceptorFactory) -> Self {
        Self {
            factory,
            role: Role::Caller,
        }
    }

    /// 服务端拦截
    pub fn callee(factory: InterceptorFactory) -> Self {
        Self {
            factory,
            role: Role::Callee,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl<S> Layer<S> for InterceptorLayer {
    type Service = InterceptedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptedService {
            inner,
            factory: self.factory.clone(),
            role: self.role,
        }
    }
}

#[derive(Clone)]
pub struct InterceptedService<S> {
    inner: S,
    factory: InterceptorFactory,
    role: Role,
}

impl<S> Service<Request<Body>> for InterceptedService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // 使用已经 ready 的实例，把新克隆留给下一次调用
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let dispatcher = match self.factory.create(request.uri().path(), self.role) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                error!(
                    path = %request.uri().path(),
                    role = %self.role,
                    error = %e,
                    "Method not registered for interception, passing through"
                );
                return Box::pin(inner.call(request));
            }
        };

        let call: SharedCall = Arc::new(Mutex::new(dispatcher));
        match self.role {
            Role::Caller => Box::pin(intercept_caller(inner, request, call)),
            Role::Callee => Box::pin(intercept_callee(inner, request, call)),
        }
    }
}

async fn intercept_caller<S>(
    mut inner: S,
    request: Request<Body>,
    call: SharedCall,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<Body>, Response = Response<Body>>,
{
    let decision = {
        let mut batch =
            TransportBatch::new(&[HookPhase::PreSendInitialMetadata]).with_metadata(request.headers());
        lock(&call).intercept(&mut batch)
    };

    if let ChainDecision::Hijack(status) = decision {
        finish_caller(&call, status.clone());
        return Ok(status_response(&status));
    }

    let request = request.map(|body| Body::new(ObservedBody::new(body, call.clone(), Flow::Outbound)));
    let response = inner.call(request).await?;

    let (parts, body) = response.into_parts();
    if let Some(status) = status_from_headers(&parts.headers) {
        // trailers-only 响应，body 里不会再有消息
        finish_caller(&call, status);
        return Ok(Response::from_parts(parts, body));
    }

    let body = Body::new(ObservedBody::new(body, call, Flow::Inbound));
    Ok(Response::from_parts(parts, body))
}

async fn intercept_callee<S>(
    mut inner: S,
    request: Request<Body>,
    call: SharedCall,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<Body>, Response = Response<Body>>,
{
    let request = request.map(|body| Body::new(ObservedBody::new(body, call.clone(), Flow::Inbound)));
    let response = inner.call(request).await?;
    let (parts, body) = response.into_parts();

    let decision = {
        let mut batch =
            TransportBatch::new(&[HookPhase::PreSendInitialMetadata]).with_metadata(&parts.headers);
        lock(&call).intercept(&mut batch)
    };

    if let ChainDecision::Hijack(status) = decision {
        drop(body);
        finish_callee(&call, status.clone());
        return Ok(status_response(&status));
    }

    if let Some(status) = status_from_headers(&parts.headers) {
        finish_callee(&call, status);
        return Ok(Response::from_parts(parts, body));
    }

    let body = Body::new(ObservedBody::new(body, call, Flow::Outbound));
    Ok(Response::from_parts(parts, body))
}

fn finish_caller(call: &SharedCall, status: CallStatus) {
    let mut dispatcher = lock(call);
    let descriptor = dispatcher.call();
    let streams_recv = descriptor.cardinality.streams_recv(descriptor.role);
    let mut batch =
        TransportBatch::new(&final_phases(streams_recv, HookPhase::PostRecvStatus)).with_recv_status(status);
    dispatcher.intercept(&mut batch);
}

fn finish_callee(call: &SharedCall, status: CallStatus) {
    let mut batch = TransportBatch::new(&[HookPhase::PreSendStatus]).with_send_status(status);
    lock(call).intercept(&mut batch);
}

/// 只有状态的 trailers-only 响应
fn status_response(status: &CallStatus) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));

    let status = tonic::Status::from(status.clone());
    if let Err(e) = status.add_header(response.headers_mut()) {
        warn!(error = %e, "Failed to encode hijack status into headers");
    }
    response
}
