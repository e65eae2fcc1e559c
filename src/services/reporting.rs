use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::db::{queries, report_queries};
use crate::errors::AppError;
use crate::models::blank;
use crate::models::{Claims, Report, ReportType};

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default, deserialize_with = "blank::opt")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub to: Option<NaiveDate>,
}

/// Runs the aggregation for `report_type`, stores the snapshot and returns it.
pub fn generate(
    conn: &Connection,
    actor: &Claims,
    report_type: ReportType,
    req: ReportRequest,
    now: NaiveDateTime,
) -> Result<Report, AppError> {
    require_staff(actor)?;

    let (parameters, data) = match report_type {
        ReportType::DailyBookings => {
            let date = req.date.unwrap_or_else(|| now.date());
            let data = report_queries::daily_bookings(conn, &date)?;
            (json!({ "date": date }), serde_json::to_value(data).map_err(anyhow::Error::from)?)
        }
        ReportType::Revenue => {
            let (from, to) = range(&req)?;
            let data = report_queries::revenue_analysis(conn, &from, &to)?;
            (json!({ "from": from, "to": to }), serde_json::to_value(data).map_err(anyhow::Error::from)?)
        }
        ReportType::TechnicianPerformance => {
            let (from, to) = range(&req)?;
            let data = report_queries::technician_performance(conn, &from, &to)?;
            (json!({ "from": from, "to": to }), serde_json::to_value(data).map_err(anyhow::Error::from)?)
        }
        ReportType::AdPerformance => {
            let data = report_queries::ad_performance(conn)?;
            (json!({}), serde_json::to_value(data).map_err(anyhow::Error::from)?)
        }
    };

    let id = queries::insert_report(conn, report_type, &parameters, &data, actor.user_id, &now)?;
    tracing::info!(report = id, kind = report_type.as_str(), user = actor.user_id, "report generated");

    Ok(Report {
        id,
        report_type,
        parameters,
        data,
        generated_by: actor.user_id,
        created_at: now,
    })
}

pub fn list_reports(
    conn: &Connection,
    actor: &Claims,
    report_type: Option<&str>,
) -> Result<Vec<Report>, AppError> {
    require_staff(actor)?;
    let report_type = report_type
        .map(|t| ReportType::parse(t).ok_or_else(|| AppError::validation(format!("Invalid report type: {t}"))))
        .transpose()?;
    Ok(queries::list_reports(conn, report_type, DEFAULT_LIST_LIMIT)?)
}

pub fn get_report(conn: &Connection, actor: &Claims, id: i64) -> Result<Report, AppError> {
    require_staff(actor)?;
    queries::get_report(conn, id)?.ok_or_else(|| AppError::not_found("Report not found"))
}

fn range(req: &ReportRequest) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (Some(from), Some(to)) = (req.from, req.to) else {
        return Err(AppError::validation("Missing required fields: from, to"));
    };
    if from > to {
        return Err(AppError::validation("from must not be after to"));
    }
    Ok((from, to))
}

fn require_staff(actor: &Claims) -> Result<(), AppError> {
    if !actor.is_staff() {
        return Err(AppError::forbidden("Reports are available to managers only"));
    }
    Ok(())
}
