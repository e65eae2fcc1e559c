use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::handlers::{authenticate, created, now, ok, ApiResult, Created};
use crate::models::invoice::RecordPayment;
use crate::models::{InvoiceOwner, Payment};
use crate::services::payment::{self, InvoiceDetails};
use crate::state::AppState;

// POST /api/payment
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<RecordPayment>, JsonRejection>,
) -> Created<Payment> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let Json(req) = body?;
    let mut db = state.conn()?;
    created(payment::record_payment(&mut db, &actor, req, now())?)
}

// GET /api/payment/invoice/booking/:id
pub async fn booking_invoice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<InvoiceDetails> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    ok(payment::invoice_details(&db, &actor, InvoiceOwner::Booking(id))?)
}

// GET /api/payment/invoice/advertisement/:id
pub async fn advertisement_invoice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<InvoiceDetails> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    ok(payment::invoice_details(&db, &actor, InvoiceOwner::Advertisement(id))?)
}
