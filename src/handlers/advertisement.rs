use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::handlers::{authenticate, created, list, now, ok, ApiResult, Created};
use crate::models::advertisement::CreateAdvertisement;
use crate::models::Advertisement;
use crate::services::advertisement::{self, CreatedAdvertisement, Engagement};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdsQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AdStatusUpdate {
    pub status: Option<String>,
}

// POST /api/advertisement
pub async fn create_advertisement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateAdvertisement>, JsonRejection>,
) -> Created<CreatedAdvertisement> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    created(advertisement::create_advertisement(&mut db, &actor, req, now())?)
}

// GET /api/advertisement
pub async fn list_advertisements(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdsQuery>,
) -> ApiResult<Vec<Advertisement>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let db = state.conn()?;
    list(advertisement::list_advertisements(&db, &actor, status)?)
}

// GET /api/advertisement/:id
pub async fn get_advertisement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Advertisement> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    ok(advertisement::get_advertisement(&db, &actor, id)?)
}

// PUT /api/advertisement/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<AdStatusUpdate>, JsonRejection>,
) -> ApiResult<Advertisement> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let status = req.status.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let mut db = state.conn()?;
    ok(advertisement::update_status(&mut db, &actor, id, status)?)
}

// POST /api/advertisement/:id/impression
pub async fn record_impression(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Advertisement> {
    let db = state.conn()?;
    ok(advertisement::record_engagement(&db, id, Engagement::Impression)?)
}

// POST /api/advertisement/:id/click
pub async fn record_click(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Advertisement> {
    let db = state.conn()?;
    ok(advertisement::record_engagement(&db, id, Engagement::Click)?)
}
