use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::handlers::{authenticate, created, list, now, ok, ApiResult, Created};
use crate::models::{Report, ReportType};
use crate::services::reporting::{self, ReportRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReportsQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

async fn generate(
    state: Arc<AppState>,
    headers: HeaderMap,
    report_type: ReportType,
    body: Option<Result<Json<ReportRequest>, JsonRejection>>,
) -> Created<Report> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    // A bare POST without a JSON body runs the report with its defaults.
    let req = match body {
        Some(Ok(Json(req))) => req,
        Some(Err(JsonRejection::MissingJsonContentType(_))) | None => ReportRequest::default(),
        Some(Err(rejection)) => return Err(rejection.into()),
    };
    let db = state.conn()?;
    created(reporting::generate(&db, &actor, report_type, req, now())?)
}

// POST /api/report/daily-bookings
pub async fn daily_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> Created<Report> {
    generate(state, headers, ReportType::DailyBookings, Some(body)).await
}

// POST /api/report/revenue
pub async fn revenue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> Created<Report> {
    generate(state, headers, ReportType::Revenue, Some(body)).await
}

// POST /api/report/technician-performance
pub async fn technician_performance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> Created<Report> {
    generate(state, headers, ReportType::TechnicianPerformance, Some(body)).await
}

// POST /api/report/ad-performance
pub async fn ad_performance(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Created<Report> {
    generate(state, headers, ReportType::AdPerformance, None).await
}

// GET /api/report
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ReportsQuery>,
) -> ApiResult<Vec<Report>> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let report_type = query.report_type.as_deref().filter(|s| !s.is_empty());
    let db = state.conn()?;
    list(reporting::list_reports(&db, &actor, report_type)?)
}

// GET /api/report/:id
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Report> {
    let actor = authenticate(&headers, &state.config.jwt_secret)?;
    let db = state.conn()?;
    ok(reporting::get_report(&db, &actor, id)?)
}
