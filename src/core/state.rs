//! 单个请求的流程阶段
//!
//! Unauthenticated → Authenticated → Validated → Pipelined → (SideEffectAttempted | SideEffectSkipped) → Assembled，
//! 任一阶段可以提前以 Rejected 结束；只有发布阶段允许失败而不终止流程。

use std::fmt;

/// 流程阶段（用于日志与诊断）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStage {
    Unauthenticated,
    Authenticated,
    Validated,
    Pipelined,
    SideEffectAttempted,
    SideEffectSkipped,
    Assembled,
    Rejected,
}

impl FlowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStage::Unauthenticated => "unauthenticated",
            FlowStage::Authenticated => "authenticated",
            FlowStage::Validated => "validated",
            FlowStage::Pipelined => "pipelined",
            FlowStage::SideEffectAttempted => "side_effect_attempted",
            FlowStage::SideEffectSkipped => "side_effect_skipped",
            FlowStage::Assembled => "assembled",
            FlowStage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
