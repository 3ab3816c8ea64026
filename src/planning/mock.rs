//! Echo 管线（用于本地开发与测试，无需外部服务）
//!
//! 把收到的请求体原样放进计划，并补上空的 sprint_backlogs / estimated_backlog / assignments。

use async_trait::async_trait;
use serde_json::Value;

use crate::planning::{PipelineRequest, PlanningPipeline, PlanningResult};

#[derive(Debug, Default)]
pub struct EchoPlanningPipeline;

#[async_trait]
impl PlanningPipeline for EchoPlanningPipeline {
    async fn run(&self, request: &PipelineRequest<'_>) -> anyhow::Result<PlanningResult> {
        let mut plan = serde_json::to_value(request)?;
        if let Value::Object(map) = &mut plan {
            for key in ["sprint_backlogs", "estimated_backlog", "assignments"] {
                map.entry(key).or_insert_with(|| Value::Array(Vec::new()));
            }
        }
        Ok(PlanningResult(plan))
    }
}
