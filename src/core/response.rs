//! Response Assembler：合并计划、发布结果与标题为最终响应

use serde::Serialize;

use crate::integrations::SideEffectOutcome;
use crate::planning::PlanningResult;

/// POST /api/scrum/analyze 的成功响应；所有字段总是存在
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub success: bool,
    pub project_title: String,
    pub plan: PlanningResult,
    #[serde(rename = "github")]
    pub side_effect: SideEffectOutcome,
}

pub fn assemble(
    project_title: String,
    plan: PlanningResult,
    side_effect: SideEffectOutcome,
) -> PlanResponse {
    PlanResponse {
        success: true,
        project_title,
        plan,
        side_effect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skipped_is_explicit_on_the_wire() {
        let resp = assemble(
            "Todo".into(),
            PlanningResult(json!({ "sprint_backlogs": [] })),
            SideEffectOutcome::Skipped,
        );
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "success": true,
                "project_title": "Todo",
                "plan": { "sprint_backlogs": [] },
                "github": { "status": "skipped" }
            })
        );
    }
}
