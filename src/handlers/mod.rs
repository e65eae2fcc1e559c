pub mod advertisement;
pub mod booking;
pub mod catalog;
pub mod directory;
pub mod health;
pub mod payment;
pub mod refund;
pub mod report;
pub mod tracking;

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Claims;
use crate::services::auth;

/// The `{success, data, error, meta}` envelope every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub count: usize,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: Some(data),
        meta: None,
    }))
}

pub fn created<T: Serialize>(data: T) -> Created<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            meta: None,
        }),
    ))
}

pub fn list<T: Serialize>(items: Vec<T>) -> ApiResult<Vec<T>> {
    let count = items.len();
    Ok(Json(ApiResponse {
        success: true,
        data: Some(items),
        meta: Some(Meta { count }),
    }))
}

/// Verifies the bearer token and returns its claims.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    auth::verify_token(secret, token, chrono::Utc::now().timestamp()).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        AppError::Unauthorized(e.to_string())
    })
}

/// Wall-clock time the workshop operates in.
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
