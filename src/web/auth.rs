//! /api/auth/*：注册、登录、当前用户、登出
//!
//! 登录成功后由 Token Codec 签发令牌；登出是无状态的（令牌到期前仍然有效）。

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::core::{ApiError, ValidationFailure};
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationFailure> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationFailure::MissingField(field))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let username = required(req.username, "username")?;
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let identity = state.users.register(&username, &email, &password).await?;
    tracing::info!(subject = %identity.subject_id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": {
                "id": identity.subject_id,
                "username": identity.display_name,
                "email": email,
            }
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Option<Json<LoginRequest>>,
) -> Result<Json<Value>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let identity = state
        .users
        .find_by_credentials(&email, &password)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let ttl = state.config.auth.token_ttl().ok_or_else(|| {
        ApiError::Internal(format!(
            "auth.token_ttl_hours out of range: {}",
            state.config.auth.token_ttl_hours
        ))
    })?;
    let issued = state
        .gate
        .codec()
        .issue(&identity.subject_id, &identity.display_name, ttl)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(subject = %identity.subject_id, "login succeeded");

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": issued.token,
        "user": {
            "id": identity.subject_id,
            "username": identity.display_name,
            "email": email,
        }
    })))
}

/// GET /api/auth/me
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": {
            "id": identity.subject_id,
            "username": identity.display_name,
        }
    }))
}

/// POST /api/auth/logout
pub async fn logout(Extension(identity): Extension<Identity>) -> Json<Value> {
    tracing::debug!(subject = %identity.subject_id, "logout");
    Json(json!({
        "success": true,
        "message": "Logged out successfully",
    }))
}
