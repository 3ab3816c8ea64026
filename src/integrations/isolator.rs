//! Side-Effect Isolator：按条件调用发布集成，失败只体现在返回值里
//!
//! 凭据或账号缺失 → Skipped，不发起任何调用；
//! 调用出错（包括发布实现 panic）→ Failed，绝不向上传播，也不会改变请求的成功状态。

use std::sync::Arc;

use serde::Serialize;

use crate::config::PublishingSection;
use crate::core::SideEffectFailure;
use crate::integrations::{BoardPublisher, BoardReference};
use crate::planning::{PlanningCommand, PlanningResult};

/// 发布结果，响应中总是存在（字段名 github），以 status 区分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SideEffectOutcome {
    Skipped,
    Succeeded(BoardReference),
    Failed { error: String },
}

impl SideEffectOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, SideEffectOutcome::Skipped)
    }
}

impl From<Result<BoardReference, SideEffectFailure>> for SideEffectOutcome {
    fn from(result: Result<BoardReference, SideEffectFailure>) -> Self {
        match result {
            Ok(board) => SideEffectOutcome::Succeeded(board),
            Err(failure) => SideEffectOutcome::Failed {
                error: failure.detail,
            },
        }
    }
}

pub struct SideEffectIsolator {
    publisher: Arc<dyn BoardPublisher>,
    publishing: PublishingSection,
}

impl SideEffectIsolator {
    pub fn new(publisher: Arc<dyn BoardPublisher>, publishing: PublishingSection) -> Self {
        Self {
            publisher,
            publishing,
        }
    }

    pub async fn publish(
        &self,
        result: &PlanningResult,
        command: &PlanningCommand,
        project_title: &str,
    ) -> SideEffectOutcome {
        let Some((credential, account)) = self.publishing.eligible() else {
            tracing::debug!("publishing credentials absent, side effect skipped");
            return SideEffectOutcome::Skipped;
        };

        let outcome: SideEffectOutcome = self
            .try_publish(credential, account, project_title, result, command)
            .await
            .into();
        match &outcome {
            SideEffectOutcome::Succeeded(board) => {
                tracing::info!(board_url = %board.board_url, "board published");
            }
            SideEffectOutcome::Failed { error } => {
                tracing::warn!(detail = %error, "board publishing failed (non-blocking)");
            }
            SideEffectOutcome::Skipped => {}
        }
        outcome
    }

    /// 在独立任务中调用发布实现，panic 也会被收敛为 SideEffectFailure
    async fn try_publish(
        &self,
        credential: &str,
        account: &str,
        project_title: &str,
        result: &PlanningResult,
        command: &PlanningCommand,
    ) -> Result<BoardReference, SideEffectFailure> {
        let publisher = Arc::clone(&self.publisher);
        let credential = credential.to_string();
        let account = account.to_string();
        let project_title = project_title.to_string();
        let plan = result.clone();
        let members = command.team.clone();

        let handle = tokio::spawn(async move {
            publisher
                .publish_board(&credential, &account, &project_title, &plan, &members)
                .await
        });

        match handle.await {
            Ok(Ok(board)) => Ok(board),
            Ok(Err(e)) => Err(SideEffectFailure {
                detail: format!("{:#}", e),
            }),
            Err(join_err) => Err(SideEffectFailure {
                detail: format!("publisher aborted: {}", join_err),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::TeamMember;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedPublisher {
        calls: AtomicUsize,
        mode: &'static str,
    }

    #[async_trait]
    impl BoardPublisher for ScriptedPublisher {
        async fn publish_board(
            &self,
            _credential: &str,
            account: &str,
            project_title: &str,
            _plan: &PlanningResult,
            _members: &[TeamMember],
        ) -> anyhow::Result<BoardReference> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                "ok" => Ok(BoardReference {
                    board_url: format!("https://tracker.example/{}/{}", account, project_title),
                }),
                "panic" => panic!("tracker client blew up"),
                _ => Err(anyhow::anyhow!("401 Bad credentials")),
            }
        }
    }

    fn publishing(credential: Option<&str>, account: Option<&str>) -> PublishingSection {
        PublishingSection {
            credential: credential.map(String::from),
            account: account.map(String::from),
            ..Default::default()
        }
    }

    fn command() -> PlanningCommand {
        PlanningCommand {
            specification_text: "Build a todo app".into(),
            team: Vec::new(),
            sprint_length_days: 2,
            sprint_capacity_points: 20,
        }
    }

    async fn run(mode: &'static str, cfg: PublishingSection) -> (SideEffectOutcome, usize) {
        let publisher = Arc::new(ScriptedPublisher {
            calls: AtomicUsize::new(0),
            mode,
        });
        let isolator = SideEffectIsolator::new(publisher.clone(), cfg);
        let outcome = isolator
            .publish(&PlanningResult(json!({})), &command(), "todo")
            .await;
        (outcome, publisher.calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_skipped_without_credentials() {
        for cfg in [
            publishing(None, None),
            publishing(Some("tok"), None),
            publishing(None, Some("octocat")),
            publishing(Some(""), Some("octocat")),
        ] {
            let (outcome, calls) = run("ok", cfg).await;
            assert_eq!(outcome, SideEffectOutcome::Skipped);
            assert_eq!(calls, 0);
        }
    }

    #[tokio::test]
    async fn test_success() {
        let (outcome, calls) = run("ok", publishing(Some("tok"), Some("octocat"))).await;
        assert_eq!(
            outcome,
            SideEffectOutcome::Succeeded(BoardReference {
                board_url: "https://tracker.example/octocat/todo".into()
            })
        );
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_error_becomes_failed() {
        let (outcome, _) = run("err", publishing(Some("tok"), Some("octocat"))).await;
        match outcome {
            SideEffectOutcome::Failed { error } => assert!(error.contains("Bad credentials")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_failed() {
        let (outcome, _) = run("panic", publishing(Some("tok"), Some("octocat"))).await;
        assert!(matches!(outcome, SideEffectOutcome::Failed { .. }));
    }

    #[test]
    fn test_wire_shape() {
        assert_eq!(
            serde_json::to_value(SideEffectOutcome::Skipped).unwrap(),
            json!({ "status": "skipped" })
        );
        assert_eq!(
            serde_json::to_value(SideEffectOutcome::Succeeded(BoardReference {
                board_url: "u".into()
            }))
            .unwrap(),
            json!({ "status": "succeeded", "board_url": "u" })
        );
        assert_eq!(
            serde_json::to_value(SideEffectOutcome::Failed { error: "e".into() }).unwrap(),
            json!({ "status": "failed", "error": "e" })
        );
    }
}
