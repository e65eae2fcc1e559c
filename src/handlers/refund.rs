use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::handlers::{authenticate, list, now, ok, ApiResult};
use crate::models::Refund;
use crate::services::refunds;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RefundsQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct RefundStatusUpdate {
    pub status: String,
}

// GET /api/refund
pub async fn list_refunds(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RefundsQuery>,
) -> ApiResult<Vec<Refund>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let db = state.conn()?;
    list(refunds::list_refunds(&db, &actor, status)?)
}

// PUT /api/refund/:id
pub async fn update_refund(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<RefundStatusUpdate>, JsonRejection>,
) -> ApiResult<Refund> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    ok(refunds::update_refund_status(&mut db, &actor, id, req.status.trim(), now())?)
}
