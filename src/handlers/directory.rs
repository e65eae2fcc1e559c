use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::handlers::{authenticate, created, list, ApiResult, Created};
use crate::models::{Advertiser, Customer, Technician, Vehicle};
use crate::services::directory::{self, NewAdvertiser, NewCustomer, NewTechnician, NewVehicle};
use crate::state::AppState;

// GET /api/customer
pub async fn list_customers(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Vec<Customer>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(directory::list_customers(&db, &actor)?)
}

// POST /api/customer
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> Created<Customer> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(directory::create_customer(&db, &actor, req)?)
}

// GET /api/customer/:id/vehicle
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(customer_id): Path<i64>,
) -> ApiResult<Vec<Vehicle>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(directory::list_vehicles(&db, &actor, customer_id)?)
}

// POST /api/customer/:id/vehicle
pub async fn add_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(customer_id): Path<i64>,
    body: Result<Json<NewVehicle>, JsonRejection>,
) -> Created<Vehicle> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(directory::add_vehicle(&db, &actor, customer_id, req)?)
}

// GET /api/technician
pub async fn list_technicians(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Vec<Technician>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(directory::list_technicians(&db, &actor)?)
}

// POST /api/technician
pub async fn create_technician(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewTechnician>, JsonRejection>,
) -> Created<Technician> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(directory::create_technician(&db, &actor, req)?)
}

// POST /api/advertiser
pub async fn create_advertiser(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewAdvertiser>, JsonRejection>,
) -> Created<Advertiser> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let db = state.conn()?;
    created(directory::create_advertiser(&db, &actor, req)?)
}
