//! 调用控制：每个批次必须且只能做出一次 Proceed / Hijack 决定
//!
//! [`ChainController`] 以守卫的形式包住批次。决定方法会消耗守卫，所以不可能决定两次；
//! 守卫在未决定的情况下被丢弃（例如提取过程中 panic 展开）时会自动 Proceed，
//! 调用因此不会被挂起

use tracing::{error, warn};

use crate::batch::{CallStatus, HookBatch};
use crate::error::{InterceptError, InterceptResult};
use crate::phase::{CallDescriptor, HookPhase};

/// 批次的调用控制决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainDecision {
    Proceed,
    /// 拦截器接管，调用以给定状态结束
    Hijack(CallStatus),
}

/// 决定是否接管调用
pub trait HijackPolicy: Send + Sync {
    /// 返回 Some 时以该状态结束调用，不再交给默认处理
    fn hijack(&self, call: &CallDescriptor) -> Option<CallStatus>;
}

/// 默认策略：从不接管
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverHijack;

impl HijackPolicy for NeverHijack {
    fn hijack(&self, _call: &CallDescriptor) -> Option<CallStatus> {
        None
    }
}

/// 接管只允许出现在包含 PRE_SEND_INITIAL_METADATA 的批次，且每个调用至多一次
pub fn check_hijack<B: HookBatch + ?Sized>(batch: &B, hijacked_before: bool) -> InterceptResult<()> {
    if hijacked_before {
        return Err(InterceptError::hijack_rejected("call already hijacked"));
    }
    if !batch.is_active(HookPhase::PreSendInitialMetadata) {
        return Err(InterceptError::hijack_rejected(
            "batch does not contain PRE_SEND_INITIAL_METADATA",
        ));
    }
    Ok(())
}

/// 批次作用域内的调用控制守卫
pub struct ChainController<'a, B: HookBatch + ?Sized> {
    batch: &'a mut B,
    decided: bool,
}

impl<'a, B: HookBatch + ?Sized> ChainController<'a, B> {
    pub fn new(batch: &'a mut B) -> Self {
        Self {
            batch,
            decided: false,
        }
    }

    pub fn batch(&self) -> &B {
        &*self.batch
    }

    /// 继续默认处理
    pub fn proceed(mut self) -> ChainDecision {
        self.decided = true;
        self.batch.proceed();
        ChainDecision::Proceed
    }

    /// 接管调用；不满足条件时退回 Proceed
    pub fn hijack(mut self, status: CallStatus, hijacked_before: &mut bool) -> ChainDecision {
        if let Err(e) = check_hijack(&*self.batch, *hijacked_before) {
            warn!(error = %e, "Hijack not allowed, proceeding instead");
            return self.proceed();
        }

        self.decided = true;
        *hijacked_before = true;
        self.batch.hijack();
        ChainDecision::Hijack(status)
    }
}

impl<B: HookBatch + ?Sized> Drop for ChainController<'_, B> {
    fn drop(&mut self) {
        if !self.decided {
            error!("Batch evaluation ended without a chain decision, proceeding");
            self.batch.proceed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBatch;

    #[test]
    fn test_proceed_decides_once() {
        let mut batch = ScriptedBatch::new(&[HookPhase::PreSendMessage]);
        let decision = ChainController::new(&mut batch).proceed();
        assert_eq!(decision, ChainDecision::Proceed);
        assert_eq!(batch.decisions, vec!["proceed"]);
    }

    #[test]
    fn test_dropped_guard_proceeds() {
        let mut batch = ScriptedBatch::new(&[HookPhase::PostRecvMessage]);
        {
            let _chain = ChainController::new(&mut batch);
        }
        assert_eq!(batch.decisions, vec!["proceed"]);
    }

    #[test]
    fn test_guard_proceeds_while_unwinding() {
        let mut batch = ScriptedBatch::new(&[HookPhase::PostRecvMessage]);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _chain = ChainController::new(&mut batch);
            panic!("extraction blew up");
        }));
        assert!(result.is_err());
        assert_eq!(batch.decisions, vec!["proceed"]);
    }

    #[test]
    fn test_hijack_on_initial_metadata() {
        let mut batch = ScriptedBatch::new(&[HookPhase::PreSendInitialMetadata]);
        let mut hijacked = false;
        let status = CallStatus::new(tonic::Code::Unavailable, "maintenance");

        let decision = ChainController::new(&mut batch).hijack(status.clone(), &mut hijacked);
        assert_eq!(decision, ChainDecision::Hijack(status));
        assert!(hijacked);
        assert_eq!(batch.decisions, vec!["hijack"]);
    }

    #[test]
    fn test_hijack_rejected_outside_initial_metadata() {
        let mut batch = ScriptedBatch::new(&[HookPhase::PreSendMessage]);
        let mut hijacked = false;

        let decision = ChainController::new(&mut batch).hijack(CallStatus::ok(), &mut hijacked);
        assert_eq!(decision, ChainDecision::Proceed);
        assert!(!hijacked);
        assert_eq!(batch.decisions, vec!["proceed"]);
    }

    #[test]
    fn test_hijack_at_most_once_per_call() {
        let mut hijacked = false;

        let mut first = ScriptedBatch::new(&[HookPhase::PreSendInitialMetadata]);
        ChainController::new(&mut first).hijack(CallStatus::ok(), &mut hijacked);

        let mut second = ScriptedBatch::new(&[HookPhase::PreSendInitialMetadata]);
        let decision = ChainController::new(&mut second).hijack(CallStatus::ok(), &mut hijacked);

        assert_eq!(decision, ChainDecision::Proceed);
        assert_eq!(first.decisions, vec!["hijack"]);
        assert_eq!(second.decisions, vec!["proceed"]);
        assert!(check_hijack(&second, hijacked).is_err());
    }
}
