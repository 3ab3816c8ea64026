//! 规划：请求校验、管线调用、标题提取

pub mod command;
pub mod mock;
pub mod pipeline;
pub mod title;

pub use command::{PlanningCommand, PlanningDefaults, RequestValidator, TeamMember};
pub use mock::EchoPlanningPipeline;
pub use pipeline::{
    HttpPlanningPipeline, PipelineInvoker, PipelineRequest, PlanningPipeline, PlanningResult,
};
pub use title::{HeadingTitleExtractor, TitleExtractor};
