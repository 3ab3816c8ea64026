//! HTTP 层：路由、共享状态与错误响应
//!
//! 受保护路由（/api/auth/me、/api/auth/logout、/api/scrum/analyze）挂 Auth Gate 中间件；
//! 其余为公开路由。所有非 2xx 响应体为 {"success": false, "error": ..., "code": ...}。

pub mod auth;
pub mod planning;

use std::any::Any;
use std::sync::Arc;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{require_identity, AuthGate};
use crate::config::AppConfig;
use crate::core::{ApiError, PlanningService};
use crate::store::UserStore;

/// 跨请求共享、启动后只读的状态
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub gate: Arc<AuthGate>,
    pub planning: Arc<PlanningService>,
}

/// 创建完整路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/scrum/analyze", post(planning::analyze))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.gate),
            require_identity,
        ));

    let public = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    public
        .merge(protected)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
        .with_state(state)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}

/// handler 内 panic 的兜底：500 + 诊断信息
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(detail).into_response()
}
