//! 观察经过的 HTTP body，把帧、流结束和 trailers 转成批次

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use http::HeaderMap;
use http_body::{Body, Frame, SizeHint};
use tracing::warn;

use super::batch::TransportBatch;
use super::frame::FrameDecoder;
use super::{SharedCall, lock};
use crate::batch::{CallStatus, SerializedMessage};
use crate::phase::{HookPhase, Role};

/// 缺少 grpc-status 时使用的状态文本
pub const MISSING_STATUS_TEXT: &str = "stream closed without grpc-status";

/// body 相对于本侧的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 本侧发出
    Outbound,
    /// 本侧收到
    Inbound,
}

pub struct ObservedBody<B> {
    inner: Pin<Box<B>>,
    call: SharedCall,
    role: Role,
    flow: Flow,
    decoder: FrameDecoder,
    finished: bool,
}

impl<B> ObservedBody<B> {
    pub fn new(inner: B, call: SharedCall, flow: Flow) -> Self {
        let role = lock(&call).call().role;
        Self {
            inner: Box::pin(inner),
            call,
            role,
            flow,
            decoder: FrameDecoder::default(),
            finished: false,
        }
    }

    fn observe_data(&mut self, data: &[u8]) {
        self.decoder.push(data);
        while let Some(frame) = self.decoder.next_frame() {
            let message = SerializedMessage {
                bytes: &frame.payload,
                compressed: frame.compressed,
            };
            let mut batch = match self.flow {
                Flow::Outbound => TransportBatch::new(&[HookPhase::PreSendMessage]).with_send(message),
                Flow::Inbound => TransportBatch::new(&[HookPhase::PostRecvMessage]).with_recv(message),
            };
            lock(&self.call).intercept(&mut batch);
        }
    }

    /// body 结束：trailers 到达、流正常关闭或出错
    fn finish(&mut self, end: BodyEnd) {
        if self.finished {
            return;
        }
        self.finished = true;

        if self.decoder.buffered() > 0 {
            warn!(
                bytes = self.decoder.buffered(),
                "Body ended with an incomplete gRPC frame"
            );
        }

        let mut dispatcher = lock(&self.call);
        let call = dispatcher.call();
        let streams_recv = call.cardinality.streams_recv(call.role);

        match (call.role, self.flow) {
            (Role::Caller, Flow::Inbound) => {
                let status = match &end {
                    BodyEnd::Trailers(Some(status)) => status.clone(),
                    BodyEnd::Trailers(None) | BodyEnd::Closed => {
                        CallStatus::new(tonic::Code::Internal, MISSING_STATUS_TEXT)
                    }
                    BodyEnd::Failed(reason) => CallStatus::new(tonic::Code::Unknown, reason.clone()),
                };
                let phases = match &end {
                    BodyEnd::Failed(reason) if streams_recv => {
                        dispatcher.report_failure(HookPhase::PostRecvMessage, reason.clone());
                        vec![HookPhase::PostRecvStatus]
                    }
                    _ => final_phases(streams_recv, HookPhase::PostRecvStatus),
                };
                let mut batch = TransportBatch::new(&phases).with_recv_status(status);
                dispatcher.intercept(&mut batch);
            }
            (Role::Callee, Flow::Inbound) => {
                if streams_recv {
                    match end {
                        BodyEnd::Failed(reason) => {
                            dispatcher.report_failure(HookPhase::PostRecvMessage, reason)
                        }
                        _ => {
                            dispatcher.intercept(&mut TransportBatch::new(&[HookPhase::PostRecvMessage]));
                        }
                    }
                }
            }
            (Role::Callee, Flow::Outbound) => {
                let status = match end {
                    BodyEnd::Trailers(status) => status,
                    BodyEnd::Failed(reason) => Some(CallStatus::new(tonic::Code::Unknown, reason)),
                    BodyEnd::Closed => None,
                };
                if let Some(status) = status {
                    let mut batch =
                        TransportBatch::new(&[HookPhase::PreSendStatus]).with_send_status(status);
                    dispatcher.intercept(&mut batch);
                }
            }
            (Role::Caller, Flow::Outbound) => {}
        }
    }
}

/// body 的结束方式
enum BodyEnd {
    /// 收到 trailers，附带其中的状态
    Trailers(Option<CallStatus>),
    /// 没有 trailers 的正常结束
    Closed,
    /// 底层 body 出错
    Failed(String),
}

/// 调用结束批次的拦截点：接收方向为流时先报告流结束
pub(crate) fn final_phases(streams_recv: bool, status_phase: HookPhase) -> Vec<HookPhase> {
    if streams_recv {
        vec![HookPhase::PostRecvMessage, status_phase]
    } else {
        vec![status_phase]
    }
}

/// 从 trailers 或 trailers-only 响应头读取状态
pub(crate) fn status_from_headers(headers: &HeaderMap) -> Option<CallStatus> {
    tonic::Status::from_header_map(headers).map(|status| CallStatus::from(&status))
}

impl<B> Body for ObservedBody<B>
where
    B: Body<Data = Bytes>,
    B::Error: fmt::Display,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.observe_data(data);
                    // 服务端收到的请求流读完后可能不会再被轮询
                    if this.role == Role::Callee
                        && this.flow == Flow::Inbound
                        && this.inner.is_end_stream()
                    {
                        this.finish(BodyEnd::Closed);
                    }
                } else if let Some(trailers) = frame.trailers_ref() {
                    let status = status_from_headers(trailers);
                    this.finish(BodyEnd::Trailers(status));
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(err)) => {
                this.finish(BodyEnd::Failed(err.to_string()));
                Poll::Ready(Some(Err(err)))
            }
            None => {
                this.finish(BodyEnd::Closed);
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
