//! Auth Gate：取出 Bearer 令牌、校验、再到 User Store 解析出调用者身份
//!
//! `require_identity` 是挂在受保护路由上的 axum 中间件，成功时把 Identity 放进请求扩展，
//! 失败时直接以 401 结束请求，不会进入下游 handler。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Identity, TokenCodec};
use crate::core::{ApiError, AuthFailure, FlowStage};
use crate::store::UserStore;

const BEARER_PREFIX: &str = "Bearer ";

/// 从 Authorization 头取出令牌；缺失、前缀不符或为空都算 MissingToken
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthFailure::MissingToken)
}

pub struct AuthGate {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self { codec, users }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// 校验请求头并解析身份；返回的 subject_id 保证非空
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let token = bearer_token(headers)?;
        let claimed = self.codec.verify(token)?;
        let identity = self
            .users
            .find_by_subject_id(&claimed.subject_id)
            .await?
            .ok_or(AuthFailure::UnknownSubject)?;
        Ok(identity)
    }
}

/// axum 中间件：鉴权通过后把 Identity 放入 extensions
pub async fn require_identity(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match gate.authenticate(req.headers()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(stage = %FlowStage::Unauthenticated, code = e.code(), "request rejected by auth gate");
            return Err(e);
        }
    };
    tracing::debug!(subject = %identity.subject_id, stage = %FlowStage::Authenticated, "authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
