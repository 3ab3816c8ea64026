//! Request Validator：把松散的请求 JSON 规整为完整、不可变的 PlanningCommand
//!
//! 缺省规则在这里一次性求值，下游不再做任何动态取值：
//! - 规格文本：documentContent 优先，其次 cahier_de_charge，取第一个非空白值
//! - 冲刺天数：sprintDuration 优先，其次 sprint_length_days，缺省取配置值
//! - 冲刺容量：sprintCapacityPoints，缺省取配置值
//! - 成员：name / display_name / "{占位前缀} {序号}"；外部账号：github_login / 成员名 / 配置账号

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::core::ValidationFailure;

/// 团队成员（缺名不会导致请求失败，会补占位名）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    pub name: String,
    pub skills: Vec<String>,
    #[serde(rename = "github_login")]
    pub external_handle: String,
}

/// 校验后的规划命令，每个请求新建一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningCommand {
    pub specification_text: String,
    pub team: Vec<TeamMember>,
    pub sprint_length_days: u32,
    pub sprint_capacity_points: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlanningRequest {
    #[serde(rename = "documentContent")]
    document_content: Option<String>,
    cahier_de_charge: Option<String>,
    #[serde(rename = "teamMembers")]
    team_members: Option<Vec<RawTeamMember>>,
    #[serde(rename = "sprintDuration")]
    sprint_duration: Option<Value>,
    sprint_length_days: Option<Value>,
    #[serde(rename = "sprintCapacityPoints")]
    sprint_capacity_points: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTeamMember {
    name: Option<String>,
    display_name: Option<String>,
    skills: Option<Vec<String>>,
    github_login: Option<String>,
}

/// 校验器持有的缺省值
#[derive(Debug, Clone)]
pub struct PlanningDefaults {
    pub sprint_length_days: u32,
    pub sprint_capacity_points: u32,
    pub member_placeholder: String,
    /// 成员既无 github_login 也无名字时使用
    pub default_handle: String,
}

impl PlanningDefaults {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            sprint_length_days: cfg.planning.default_sprint_length_days.max(1),
            sprint_capacity_points: cfg.planning.default_sprint_capacity_points.max(1),
            member_placeholder: cfg.planning.member_placeholder.clone(),
            default_handle: cfg.publishing.default_handle(),
        }
    }
}

impl Default for PlanningDefaults {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct RequestValidator {
    defaults: PlanningDefaults,
}

impl RequestValidator {
    pub fn new(defaults: PlanningDefaults) -> Self {
        Self { defaults }
    }

    /// 非对象的请求体按空对象处理
    pub fn validate(&self, payload: Value) -> Result<PlanningCommand, ValidationFailure> {
        let raw: RawPlanningRequest = if payload.is_object() {
            serde_json::from_value(payload)
                .map_err(|e| ValidationFailure::MalformedPayload(e.to_string()))?
        } else {
            RawPlanningRequest::default()
        };

        let specification_text = [raw.document_content, raw.cahier_de_charge]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .ok_or(ValidationFailure::MissingSpecification)?;

        let sprint_length_days = match raw.sprint_duration.or(raw.sprint_length_days) {
            Some(v) => {
                positive_int(&v).ok_or_else(|| ValidationFailure::InvalidSprintLength(v.to_string()))?
            }
            None => self.defaults.sprint_length_days,
        };

        let sprint_capacity_points = match raw.sprint_capacity_points {
            Some(v) => positive_int(&v)
                .ok_or_else(|| ValidationFailure::InvalidSprintCapacity(v.to_string()))?,
            None => self.defaults.sprint_capacity_points,
        };

        let team = raw
            .team_members
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, m)| self.member(i, m))
            .collect();

        Ok(PlanningCommand {
            specification_text,
            team,
            sprint_length_days,
            sprint_capacity_points,
        })
    }

    fn member(&self, index: usize, raw: RawTeamMember) -> TeamMember {
        let given = non_blank(raw.name).or_else(|| non_blank(raw.display_name));
        let external_handle = non_blank(raw.github_login)
            .or_else(|| given.clone())
            .unwrap_or_else(|| self.defaults.default_handle.clone());
        let name = given
            .unwrap_or_else(|| format!("{} {}", self.defaults.member_placeholder, index + 1));

        let mut skills: Vec<String> = Vec::new();
        for skill in raw.skills.unwrap_or_default() {
            let skill = skill.trim();
            if !skill.is_empty() && !skills.iter().any(|s| s == skill) {
                skills.push(skill.to_string());
            }
        }

        TeamMember {
            name,
            skills,
            external_handle,
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 整数、无小数部分的浮点数、数字字符串均可；必须 > 0
fn positive_int(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f > 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    if n == 0 {
        return None;
    }
    u32::try_from(n).ok()
}
