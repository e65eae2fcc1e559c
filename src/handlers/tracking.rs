use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::handlers::{authenticate, created, list, now, ApiResult, Created};
use crate::models::tracking::TrackingUpdate;
use crate::models::ServiceTracking;
use crate::services::tracking;
use crate::state::AppState;

// POST /api/tracking/update
pub async fn update_tracking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<TrackingUpdate>, JsonRejection>,
) -> Created<ServiceTracking> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    created(tracking::update_tracking(&mut db, &actor, req, now())?)
}

// GET /api/tracking/history/:booking_id
pub async fn tracking_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
) -> ApiResult<Vec<ServiceTracking>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(tracking::tracking_history(&db, &actor, booking_id)?)
}
