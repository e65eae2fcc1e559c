use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::handlers::{authenticate, created, list, ok, ApiResult, Created};
use crate::models::advertisement::NewPlacement;
use crate::models::catalog::{NewService, NewServicePackage, NewTimeSlot};
use crate::models::{Placement, Service, ServicePackage, TimeSlot};
use crate::services::catalog;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub is_active: bool,
}

// GET /api/service
pub async fn list_services(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Vec<Service>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(queries::list_services(&db, catalog::active_only(&actor))?)
}

// POST /api/service
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewService>, JsonRejection>,
) -> Created<Service> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(catalog::create_service(&db, &actor, req)?)
}

// GET /api/package
pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<ServicePackage>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(queries::list_packages(&db, catalog::active_only(&actor))?)
}

// POST /api/package
pub async fn create_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewServicePackage>, JsonRejection>,
) -> Created<ServicePackage> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    created(catalog::create_package(&mut db, &actor, req)?)
}

// GET /api/time-slot
pub async fn list_time_slots(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Vec<TimeSlot>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(queries::list_time_slots(&db, catalog::active_only(&actor))?)
}

// POST /api/time-slot
pub async fn create_time_slot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewTimeSlot>, JsonRejection>,
) -> Created<TimeSlot> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(catalog::create_time_slot(&db, &actor, req)?)
}

// PUT /api/time-slot/:id
pub async fn set_time_slot_active(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<SlotAvailability>, JsonRejection>,
) -> ApiResult<TimeSlot> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    ok(catalog::set_time_slot_active(&db, &actor, id, req.is_active)?)
}

// GET /api/placement
pub async fn list_placements(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Vec<Placement>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(queries::list_placements(&db, catalog::active_only(&actor))?)
}

// POST /api/placement
pub async fn create_placement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewPlacement>, JsonRejection>,
) -> Created<Placement> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(catalog::create_placement(&db, &actor, req)?)
}
