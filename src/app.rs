//! 服务装配：由配置与外部协作方构建 AppState
//!
//! 协作方（User Store / 规划管线 / 发布集成 / 标题提取）以 trait 对象注入，
//! 测试可替换为计数或故障桩；from_config 给出生产默认实现。

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthGate, TokenCodec};
use crate::config::{AppConfig, PublishingSection};
use crate::core::PlanningService;
use crate::integrations::{BoardPublisher, HttpBoardPublisher};
use crate::planning::{
    EchoPlanningPipeline, HeadingTitleExtractor, HttpPlanningPipeline, PlanningPipeline,
    TitleExtractor,
};
use crate::store::{InMemoryUserStore, UserStore};
use crate::web::AppState;

pub struct Collaborators {
    pub users: Arc<dyn UserStore>,
    pub pipeline: Arc<dyn PlanningPipeline>,
    pub publisher: Arc<dyn BoardPublisher>,
    pub titles: Arc<dyn TitleExtractor>,
}

impl Collaborators {
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let users = InMemoryUserStore::new();
        if cfg.users.seed_demo_user {
            users.seed_demo_user().await;
        }

        let pipeline: Arc<dyn PlanningPipeline> = match cfg.pipeline.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                tracing::info!(endpoint, "using HTTP planning pipeline");
                Arc::new(HttpPlanningPipeline::new(endpoint.trim()))
            }
            _ => {
                tracing::warn!("pipeline.endpoint not set, falling back to echo pipeline");
                Arc::new(EchoPlanningPipeline)
            }
        };

        let publisher = HttpBoardPublisher::new(
            cfg.publishing.endpoint().map(String::from),
            Duration::from_secs(cfg.publishing.timeout_secs),
        )?;
        match PublishingMode::of(&cfg.publishing) {
            PublishingMode::Disabled => {
                tracing::info!("publishing credential/account not configured, boards will be skipped")
            }
            PublishingMode::MissingEndpoint => tracing::warn!(
                "publishing credential/account set but publishing.endpoint is missing, every board publish will fail"
            ),
            PublishingMode::Enabled => tracing::info!("board publishing enabled"),
        }

        Ok(Self {
            users: Arc::new(users),
            pipeline,
            publisher: Arc::new(publisher),
            titles: Arc::new(HeadingTitleExtractor),
        })
    }
}

/// 启动时的发布配置状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishingMode {
    Disabled,
    /// 凭据齐全但没有 endpoint：每次发布都会以 failed 结束
    MissingEndpoint,
    Enabled,
}

impl PublishingMode {
    fn of(publishing: &PublishingSection) -> Self {
        match (publishing.eligible(), publishing.endpoint()) {
            (None, _) => PublishingMode::Disabled,
            (Some(_), None) => PublishingMode::MissingEndpoint,
            (Some(_), Some(_)) => PublishingMode::Enabled,
        }
    }
}

/// 未配置密钥时生成随机密钥；重启后旧令牌失效
fn signing_secret(cfg: &AppConfig) -> String {
    match cfg.auth.secret.as_deref().map(str::trim) {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            tracing::warn!("auth.secret not set, generated an ephemeral signing secret");
            format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
        }
    }
}

pub fn build_state(cfg: AppConfig, collaborators: Collaborators) -> Arc<AppState> {
    let codec = Arc::new(TokenCodec::from_secret(signing_secret(&cfg).as_bytes()));
    let gate = Arc::new(AuthGate::new(codec, Arc::clone(&collaborators.users)));
    let planning = Arc::new(PlanningService::from_config(
        &cfg,
        collaborators.pipeline,
        collaborators.publisher,
        collaborators.titles,
    ));

    Arc::new(AppState {
        config: Arc::new(cfg),
        users: collaborators.users,
        gate,
        planning,
    })
}
