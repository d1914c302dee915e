//! 拦截点分发
//!
//! 每个调用一个实例。运行时每交来一个批次，就按固定顺序逐个检查拦截点，
//! 每个激活的拦截点输出一条记录，最后做出唯一的调用控制决定。
//! 批次之间只保留调用描述和暂存实例

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use tracing::{error, warn};

use crate::batch::{CallStatus, HookBatch};
use crate::chain::{ChainController, ChainDecision, HijackPolicy};
use crate::error::InterceptError;
use crate::extractor::{Direction, MessageExtractor};
use crate::phase::{CallDescriptor, HookPhase, Role};
use crate::record::{RecordSink, RenderedRecord};
use crate::render::{RenderStyle, Renderer};

/// 调用结束前没有观察到状态时使用的状态文本
pub const TERMINATED_TEXT: &str = "call terminated before status was observed";

/// 致命错误处理，不返回
pub type FatalHandler = fn(&InterceptError) -> !;

/// 默认的致命错误处理：终止进程
pub fn abort_process(err: &InterceptError) -> ! {
    error!(error = %err, "Unrecoverable interceptor failure, aborting process");
    std::process::abort()
}

/// 回退路径反序列化失败时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionFailurePolicy {
    /// 交给 [`FatalHandler`]，默认终止进程
    #[default]
    Abort,
    /// 输出失败标记，批次照常 Proceed
    MarkFailed,
}

#[derive(Clone, Copy)]
pub struct InterceptorOptions {
    pub failure_policy: ExtractionFailurePolicy,
    pub render_style: RenderStyle,
    pub fatal_handler: FatalHandler,
}

impl Default for InterceptorOptions {
    fn default() -> Self {
        Self {
            failure_policy: ExtractionFailurePolicy::default(),
            render_style: RenderStyle::default(),
            fatal_handler: abort_process,
        }
    }
}

impl fmt::Debug for InterceptorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorOptions")
            .field("failure_policy", &self.failure_policy)
            .field("render_style", &self.render_style)
            .finish_non_exhaustive()
    }
}

/// 单个调用的拦截点状态机
pub struct HookPointDispatcher {
    call: CallDescriptor,
    extractor: MessageExtractor,
    renderer: Renderer,
    sink: Arc<dyn RecordSink>,
    hijack_policy: Arc<dyn HijackPolicy>,
    failure_policy: ExtractionFailurePolicy,
    fatal_handler: FatalHandler,
    hijacked: bool,
    status_emitted: bool,
}

impl HookPointDispatcher {
    pub(crate) fn new(
        call: CallDescriptor,
        extractor: MessageExtractor,
        sink: Arc<dyn RecordSink>,
        hijack_policy: Arc<dyn HijackPolicy>,
        options: InterceptorOptions,
    ) -> Self {
        Self {
            call,
            extractor,
            renderer: Renderer::new(options.render_style),
            sink,
            hijack_policy,
            failure_policy: options.failure_policy,
            fatal_handler: options.fatal_handler,
            hijacked: false,
            status_emitted: false,
        }
    }

    pub fn call(&self) -> &CallDescriptor {
        &self.call
    }

    pub fn is_hijacked(&self) -> bool {
        self.hijacked
    }

    pub fn status_emitted(&self) -> bool {
        self.status_emitted
    }

    /// 处理一个批次，返回本批次的调用控制决定
    pub fn intercept<B: HookBatch + ?Sized>(&mut self, batch: &mut B) -> ChainDecision {
        let chain = ChainController::new(batch);
        let mut hijack_status = None;

        for phase in HookPhase::ALL {
            if !chain.batch().is_active(phase) {
                continue;
            }
            if phase == HookPhase::PreSendInitialMetadata && !self.hijacked {
                hijack_status = self.hijack_policy.hijack(&self.call);
            }

            let record = self.evaluate(phase, chain.batch());
            self.emit(&record);
        }

        match hijack_status {
            Some(status) => {
                let decision = chain.hijack(status, &mut self.hijacked);
                if matches!(decision, ChainDecision::Hijack(_)) {
                    counter!("interceptor_hijacked_calls_total", "role" => self.call.role.as_str())
                        .increment(1);
                }
                decision
            }
            None => chain.proceed(),
        }
    }

    /// 运行时报告某个方向的流异常中断，输出失败标记代替流结束记录
    pub fn report_failure(&mut self, phase: HookPhase, reason: impl Into<String>) {
        let record = RenderedRecord::failure(&self.call, phase, None, reason);
        self.emit(&record);
    }

    fn evaluate<B: HookBatch + ?Sized>(&mut self, phase: HookPhase, batch: &B) -> RenderedRecord {
        match phase {
            HookPhase::PreSendInitialMetadata => {
                let body = batch
                    .initial_metadata()
                    .map(|headers| self.renderer.render_metadata(headers))
                    .unwrap_or_else(|| "{}".to_string());
                RenderedRecord::metadata(&self.call, body)
            }
            HookPhase::PreSendMessage => self.evaluate_message(Direction::Send, batch),
            HookPhase::PostRecvMessage => self.evaluate_message(Direction::Recv, batch),
            HookPhase::PreSendStatus => self.evaluate_status(phase, batch.send_status()),
            HookPhase::PostRecvStatus => self.evaluate_status(phase, batch.recv_status()),
        }
    }

    fn evaluate_message<B: HookBatch + ?Sized>(
        &mut self,
        direction: Direction,
        batch: &B,
    ) -> RenderedRecord {
        let phase = direction.phase();
        let extracted = match self.extractor.extract(direction, batch, &self.call) {
            Ok(extracted) => extracted,
            Err(err) => return self.extraction_failed(phase, err, batch.bytes_from_peer()),
        };

        let Some(message) = extracted.message() else {
            return RenderedRecord::stream_ended(&self.call, phase);
        };

        let type_name = message.type_name();
        match self.renderer.render(message) {
            Ok(body) => RenderedRecord::message(&self.call, phase, type_name, body),
            Err(err) => RenderedRecord::failure(&self.call, phase, Some(type_name), err.to_string()),
        }
    }

    fn extraction_failed(
        &mut self,
        phase: HookPhase,
        err: InterceptError,
        from_peer: bool,
    ) -> RenderedRecord {
        if err.is_extraction_failure() {
            counter!("interceptor_extraction_failures_total", "role" => self.call.role.as_str())
                .increment(1);

            // 对端发来的坏帧只影响这一条记录，由运行时自己的解码器拒绝
            let policy = if from_peer {
                ExtractionFailurePolicy::MarkFailed
            } else {
                self.failure_policy
            };
            match policy {
                ExtractionFailurePolicy::Abort => {
                    error!(
                        method = %self.call.method,
                        role = %self.call.role,
                        phase = %phase,
                        error = %err,
                        "Fallback extraction failed"
                    );
                    (self.fatal_handler)(&err)
                }
                ExtractionFailurePolicy::MarkFailed => {
                    warn!(
                        method = %self.call.method,
                        role = %self.call.role,
                        phase = %phase,
                        error = %err,
                        "Fallback extraction failed, marking record"
                    );
                }
            }
        }

        RenderedRecord::failure(&self.call, phase, None, err.to_string())
    }

    fn evaluate_status(&mut self, phase: HookPhase, status: Option<&CallStatus>) -> RenderedRecord {
        self.status_emitted = true;
        match status {
            Some(status) => RenderedRecord::status(&self.call, phase, status),
            None => RenderedRecord::status(
                &self.call,
                phase,
                &CallStatus::new(tonic::Code::Unknown, "status unavailable"),
            ),
        }
    }

    fn emit(&self, record: &RenderedRecord) {
        counter!(
            "interceptor_records_total",
            "role" => record.role.as_str(),
            "phase" => record.phase.as_str()
        )
        .increment(1);
        self.sink.emit(record);
    }
}

impl Drop for HookPointDispatcher {
    fn drop(&mut self) {
        if self.status_emitted {
            return;
        }
        let phase = match self.call.role {
            Role::Caller => HookPhase::PostRecvStatus,
            Role::Callee => HookPhase::PreSendStatus,
        };
        let status = CallStatus::new(tonic::Code::Cancelled, TERMINATED_TEXT);
        let record = RenderedRecord::status(&self.call, phase, &status);
        self.status_emitted = true;
        self.emit(&record);
    }
}
