//! Pipeline Invoker：同步调用外部规划管线
//!
//! 管线是黑盒：它自己的重试与校验不归本层管。本层不重试、不设超时（交给基础设施层），
//! 任何失败都包成 PipelineFailure 并终止请求。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::PipelineFailure;
use crate::planning::{PlanningCommand, TeamMember};

/// 管线产出的结构化计划，原样透传
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PlanningResult(pub Value);

impl PlanningResult {
    /// 取计划中的数组段（如 sprint_backlogs）；缺失或类型不符时为空数组
    pub fn section(&self, key: &str) -> Value {
        match self.0.get(key) {
            Some(v @ Value::Array(_)) => v.clone(),
            _ => Value::Array(Vec::new()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TeamPayload<'a> {
    sprint_length_days: u32,
    sprint_capacity_points: u32,
    members: &'a [TeamMember],
}

/// 发给管线的请求体
#[derive(Debug, Serialize)]
pub struct PipelineRequest<'a> {
    cahier_de_charge: &'a str,
    team: TeamPayload<'a>,
    validation_attempts: u32,
    max_validation_attempts: u32,
}

impl<'a> PipelineRequest<'a> {
    pub fn new(command: &'a PlanningCommand, max_validation_attempts: u32) -> Self {
        Self {
            cahier_de_charge: &command.specification_text,
            team: TeamPayload {
                sprint_length_days: command.sprint_length_days,
                sprint_capacity_points: command.sprint_capacity_points,
                members: &command.team,
            },
            validation_attempts: 0,
            max_validation_attempts,
        }
    }
}

/// 外部规划管线
#[async_trait]
pub trait PlanningPipeline: Send + Sync {
    async fn run(&self, request: &PipelineRequest<'_>) -> anyhow::Result<PlanningResult>;
}

/// HTTP 管线：POST 请求体到配置的 endpoint，期望返回 JSON 对象
pub struct HttpPlanningPipeline {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPlanningPipeline {
    /// 不设超时：管线调用可能很长
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PlanningPipeline for HttpPlanningPipeline {
    async fn run(&self, request: &PipelineRequest<'_>) -> anyhow::Result<PlanningResult> {
        let resp = self.client.post(&self.endpoint).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("pipeline returned {}: {}", status, text);
        }
        let body: Value = resp.json().await?;
        if !body.is_object() {
            anyhow::bail!("pipeline returned a non-object result");
        }
        Ok(PlanningResult(body))
    }
}

pub struct PipelineInvoker {
    pipeline: Arc<dyn PlanningPipeline>,
    max_validation_attempts: u32,
}

impl PipelineInvoker {
    pub fn new(pipeline: Arc<dyn PlanningPipeline>, max_validation_attempts: u32) -> Self {
        Self {
            pipeline,
            max_validation_attempts,
        }
    }

    /// 调用管线直到返回或失败；无本地重试
    pub async fn invoke(&self, command: &PlanningCommand) -> Result<PlanningResult, PipelineFailure> {
        let request = PipelineRequest::new(command, self.max_validation_attempts);
        self.pipeline.run(&request).await.map_err(|e| {
            let detail = format!("{:#}", e);
            tracing::error!(detail = %detail, "planning pipeline failed");
            PipelineFailure { detail }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyPipeline {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlanningPipeline for FlakyPipeline {
        async fn run(&self, _request: &PipelineRequest<'_>) -> anyhow::Result<PlanningResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("estimation step exhausted retries"))
        }
    }

    fn command() -> PlanningCommand {
        PlanningCommand {
            specification_text: "Build a todo app".into(),
            team: vec![TeamMember {
                name: "alice".into(),
                skills: vec!["rust".into()],
                external_handle: "alice".into(),
            }],
            sprint_length_days: 3,
            sprint_capacity_points: 20,
        }
    }

    #[test]
    fn test_pipeline_request_shape() {
        let cmd = command();
        let value = serde_json::to_value(PipelineRequest::new(&cmd, 1)).unwrap();
        assert_eq!(
            value,
            json!({
                "cahier_de_charge": "Build a todo app",
                "team": {
                    "sprint_length_days": 3,
                    "sprint_capacity_points": 20,
                    "members": [
                        { "name": "alice", "skills": ["rust"], "github_login": "alice" }
                    ]
                },
                "validation_attempts": 0,
                "max_validation_attempts": 1
            })
        );
    }

    #[tokio::test]
    async fn test_failure_is_wrapped_without_retry() {
        let pipeline = Arc::new(FlakyPipeline {
            calls: AtomicUsize::new(0),
        });
        let invoker = PipelineInvoker::new(pipeline.clone(), 1);
        let err = invoker.invoke(&command()).await.unwrap_err();
        assert!(err.detail.contains("exhausted retries"));
        assert_eq!(pipeline.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_section_defaults_to_empty_array() {
        let plan = PlanningResult(json!({ "sprint_backlogs": [1, 2], "assignments": "n/a" }));
        assert_eq!(plan.section("sprint_backlogs"), json!([1, 2]));
        assert_eq!(plan.section("assignments"), json!([]));
        assert_eq!(plan.section("estimated_backlog"), json!([]));
    }
}
