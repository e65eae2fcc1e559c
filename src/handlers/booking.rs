use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::{authenticate, created, list, now, ok, ApiResult, Created};
use crate::models::{Booking, BookingHistory, CreateBooking, UpdateBooking};
use crate::services::booking::{self, Cancellation};
use crate::services::calendar::generate_ics;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

// POST /api/booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateBooking>, JsonRejection>,
) -> Created<Booking> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    created(booking::create_booking(&mut db, &actor, req, now())?)
}

// GET /api/booking
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Vec<Booking>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let db = state.conn()?;
    list(booking::list_bookings(&db, &actor, status)?)
}

// GET /api/booking/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    ok(booking::get_booking(&db, &actor, id)?)
}

// PUT /api/booking/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Result<Json<UpdateBooking>, JsonRejection>,
) -> ApiResult<Booking> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    ok(booking::update_booking(&mut db, &actor, id, req, now())?)
}

// DELETE /api/booking/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Cancellation> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let mut db = state.conn()?;
    ok(booking::cancel_booking(&mut db, &actor, id, now())?)
}

// GET /api/booking/:id/history
pub async fn booking_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Vec<BookingHistory>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    list(booking::booking_history(&db, &actor, id)?)
}

// GET /api/booking/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let booking = {
        let db = state.conn()?;
        booking::get_booking(&db, &actor, id)?
    };

    let ics = generate_ics(&booking, &state.config.workshop_name);
    let filename = format!("booking-{}.ics", booking.ref_number);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
