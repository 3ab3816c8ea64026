//! POST /api/scrum/analyze

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde_json::Value;

use crate::auth::Identity;
use crate::core::{ApiError, PlanResponse};
use crate::web::AppState;

/// 请求体不是合法 JSON 时按空对象处理，由校验器给出 MissingSpecification
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Option<Json<Value>>,
) -> Result<Json<PlanResponse>, ApiError> {
    let payload = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let response = state.planning.analyze(&identity, payload).await?;
    Ok(Json(response))
}
