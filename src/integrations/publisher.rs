//! 看板发布集成（第三方项目追踪器）
//!
//! 只定义调用接口与一个通用 HTTP 适配器；追踪器自身的协议由发布服务负责。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::planning::{PlanningResult, TeamMember};

/// 发布成功后返回的看板引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardReference {
    pub board_url: String,
}

#[async_trait]
pub trait BoardPublisher: Send + Sync {
    async fn publish_board(
        &self,
        credential: &str,
        account: &str,
        project_title: &str,
        plan: &PlanningResult,
        members: &[TeamMember],
    ) -> anyhow::Result<BoardReference>;
}

/// 发布请求体
#[derive(Debug, Serialize)]
struct PublishBoardRequest<'a> {
    account: &'a str,
    project_title: &'a str,
    sprint_backlogs: serde_json::Value,
    estimated_backlog: serde_json::Value,
    assignments: serde_json::Value,
    team_members: &'a [TeamMember],
}

/// HTTP 发布适配器：Bearer 凭据 POST 到配置的 endpoint，期望返回 {"board_url": ...}
pub struct HttpBoardPublisher {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpBoardPublisher {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl BoardPublisher for HttpBoardPublisher {
    async fn publish_board(
        &self,
        credential: &str,
        account: &str,
        project_title: &str,
        plan: &PlanningResult,
        members: &[TeamMember],
    ) -> anyhow::Result<BoardReference> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("publishing endpoint is not configured"))?;

        let body = PublishBoardRequest {
            account,
            project_title,
            sprint_backlogs: plan.section("sprint_backlogs"),
            estimated_backlog: plan.section("estimated_backlog"),
            assignments: plan.section("assignments"),
            team_members: members,
        };

        let resp = self
            .client
            .post(endpoint)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("publishing API error {}: {}", status, text);
        }

        Ok(resp.json::<BoardReference>().await?)
    }
}
