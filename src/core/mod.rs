//! 核心编排层：错误分类、流程阶段、规划编排与响应组装

pub mod error;
pub mod orchestrator;
pub mod response;
pub mod state;

pub use error::{
    ApiError, AuthFailure, PipelineFailure, SideEffectFailure, StoreError, TokenError,
    ValidationFailure,
};
pub use orchestrator::PlanningService;
pub use response::{assemble, PlanResponse};
pub use state::FlowStage;
