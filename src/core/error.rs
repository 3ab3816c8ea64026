//! 请求编排的错误类型
//!
//! 鉴权、校验、管线三类失败会终止请求；发布失败（SideEffectFailure）只会降级为响应字段，不会成为请求失败。

use axum::http::StatusCode;
use thiserror::Error;

/// Auth Gate 的四种失败，统一映射为 401
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Token is missing")]
    MissingToken,

    #[error("Invalid token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("User not found")]
    UnknownSubject,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::Malformed => "malformed_token",
            AuthFailure::Expired => "expired_token",
            AuthFailure::UnknownSubject => "unknown_subject",
        }
    }
}

/// 请求体校验失败，统一映射为 400
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("Missing documentContent / cahier_de_charge")]
    MissingSpecification,

    #[error("Invalid sprint length: {0}")]
    InvalidSprintLength(String),

    #[error("Invalid sprint capacity: {0}")]
    InvalidSprintCapacity(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl ValidationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::MissingSpecification => "missing_specification",
            ValidationFailure::InvalidSprintLength(_) => "invalid_sprint_length",
            ValidationFailure::InvalidSprintCapacity(_) => "invalid_sprint_capacity",
            ValidationFailure::MalformedPayload(_) => "malformed_payload",
            ValidationFailure::MissingField(_) => "missing_field",
        }
    }
}

/// 外部规划管线失败（含其内部重试耗尽），对请求是致命的
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Planning pipeline failed: {detail}")]
pub struct PipelineFailure {
    pub detail: String,
}

/// 发布集成失败：只在 SideEffectIsolator 内部出现，随后转为 SideEffectOutcome::Failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Publishing failed: {detail}")]
pub struct SideEffectFailure {
    pub detail: String,
}

/// 令牌签发失败
#[derive(Error, Debug)]
pub enum TokenError {
    /// 有效期非正，或签发时刻加有效期超出可表示范围
    #[error("Invalid token lifetime: {0}")]
    InvalidLifetime(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// User Store 错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error("User store unavailable: {0}")]
    Backend(String),
}

/// HTTP 边界上的统一错误：每个变体对应一个状态码与机器可读的 code
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(f) => f.code(),
            ApiError::Validation(f) => f.code(),
            ApiError::Pipeline(_) => "pipeline_failure",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_are_401() {
        for failure in [
            AuthFailure::MissingToken,
            AuthFailure::Malformed,
            AuthFailure::Expired,
            AuthFailure::UnknownSubject,
        ] {
            assert_eq!(ApiError::from(failure).status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_status_codes_are_distinct_per_family() {
        let validation = ApiError::from(ValidationFailure::MissingSpecification);
        let pipeline = ApiError::from(PipelineFailure {
            detail: "boom".into(),
        });
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.code(), "missing_specification");
        assert_eq!(pipeline.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(pipeline.to_string().contains("boom"));
        assert_eq!(
            ApiError::NotFound("User not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_error_mapping() {
        let conflict: ApiError = StoreError::Conflict("Email already registered".into()).into();
        assert_eq!(conflict.status_code(), StatusCode::BAD_REQUEST);
        let backend: ApiError = StoreError::Backend("down".into()).into();
        assert_eq!(backend.code(), "internal");
    }
}
