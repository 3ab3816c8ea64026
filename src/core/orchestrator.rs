//! 规划编排：Request Validator → Pipeline Invoker → Side-Effect Isolator → Response Assembler
//!
//! 调用方（Auth Gate 之后的 handler）已持有 Identity。流程严格串行；前三步的失败会终止请求，
//! 发布步骤只产出 SideEffectOutcome。

use std::sync::Arc;

use serde_json::Value;

use crate::auth::Identity;
use crate::config::AppConfig;
use crate::core::{assemble, ApiError, FlowStage, PlanResponse};
use crate::integrations::{BoardPublisher, SideEffectIsolator};
use crate::planning::{
    PipelineInvoker, PlanningDefaults, PlanningPipeline, RequestValidator, TitleExtractor,
};

/// 组装好的编排组件，跨请求共享（只读）
pub struct PlanningService {
    validator: RequestValidator,
    invoker: PipelineInvoker,
    isolator: SideEffectIsolator,
    titles: Arc<dyn TitleExtractor>,
}

impl PlanningService {
    pub fn new(
        validator: RequestValidator,
        invoker: PipelineInvoker,
        isolator: SideEffectIsolator,
        titles: Arc<dyn TitleExtractor>,
    ) -> Self {
        Self {
            validator,
            invoker,
            isolator,
            titles,
        }
    }

    /// 从配置与协作方构建
    pub fn from_config(
        cfg: &AppConfig,
        pipeline: Arc<dyn PlanningPipeline>,
        publisher: Arc<dyn BoardPublisher>,
        titles: Arc<dyn TitleExtractor>,
    ) -> Self {
        Self::new(
            RequestValidator::new(PlanningDefaults::from_config(cfg)),
            PipelineInvoker::new(pipeline, cfg.planning.max_validation_attempts),
            SideEffectIsolator::new(publisher, cfg.publishing.clone()),
            titles,
        )
    }

    pub async fn analyze(&self, identity: &Identity, payload: Value) -> Result<PlanResponse, ApiError> {
        let subject = identity.subject_id.as_str();

        let command = self.validator.validate(payload).map_err(|e| {
            tracing::info!(subject, stage = %FlowStage::Rejected, reason = %e, "invalid planning request");
            e
        })?;
        tracing::debug!(
            subject,
            stage = %FlowStage::Validated,
            members = command.team.len(),
            sprint_length_days = command.sprint_length_days,
            "planning request validated"
        );

        let project_title = self.titles.extract_title(&command.specification_text);

        let plan = self.invoker.invoke(&command).await?;
        tracing::debug!(subject, stage = %FlowStage::Pipelined, "pipeline returned");

        let side_effect = self.isolator.publish(&plan, &command, &project_title).await;
        let stage = if side_effect.is_skipped() {
            FlowStage::SideEffectSkipped
        } else {
            FlowStage::SideEffectAttempted
        };
        tracing::debug!(subject, stage = %stage, "side effect settled");

        let response = assemble(project_title, plan, side_effect);
        tracing::info!(subject, stage = %FlowStage::Assembled, title = %response.project_title, "plan ready");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationFailure;
    use crate::integrations::BoardReference;
    use crate::planning::{
        EchoPlanningPipeline, HeadingTitleExtractor, PipelineRequest, PlanningResult, TeamMember,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlanningPipeline for CountingPipeline {
        async fn run(&self, request: &PipelineRequest<'_>) -> anyhow::Result<PlanningResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            EchoPlanningPipeline.run(request).await
        }
    }

    struct BrokenPublisher;

    #[async_trait]
    impl BoardPublisher for BrokenPublisher {
        async fn publish_board(
            &self,
            _credential: &str,
            _account: &str,
            _project_title: &str,
            _plan: &PlanningResult,
            _members: &[TeamMember],
        ) -> anyhow::Result<BoardReference> {
            anyhow::bail!("tracker unavailable")
        }
    }

    fn identity() -> Identity {
        Identity {
            subject_id: "u-1".into(),
            display_name: "alice".into(),
        }
    }

    fn service(cfg: &AppConfig, pipeline: Arc<CountingPipeline>) -> PlanningService {
        PlanningService::from_config(
            cfg,
            pipeline,
            Arc::new(BrokenPublisher),
            Arc::new(HeadingTitleExtractor),
        )
    }

    #[tokio::test]
    async fn test_validation_failure_skips_pipeline() {
        let pipeline = Arc::new(CountingPipeline {
            calls: AtomicUsize::new(0),
        });
        let svc = service(&AppConfig::default(), pipeline.clone());
        let err = svc
            .analyze(&identity(), json!({ "teamMembers": [] }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationFailure::MissingSpecification)
        ));
        assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_success() {
        let mut cfg = AppConfig::default();
        cfg.publishing.credential = Some("tok".into());
        cfg.publishing.account = Some("octocat".into());
        let pipeline = Arc::new(CountingPipeline {
            calls: AtomicUsize::new(0),
        });
        let svc = service(&cfg, pipeline.clone());

        let resp = svc
            .analyze(&identity(), json!({ "documentContent": "Todo app\nwith tags" }))
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(resp.project_title, "Todo app");
        assert!(matches!(
            resp.side_effect,
            crate::integrations::SideEffectOutcome::Failed { .. }
        ));
        assert_eq!(pipeline.calls.load(Ordering::SeqCst), 1);
    }
}
