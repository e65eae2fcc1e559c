use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A persisted report snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub report_type: ReportType,
    pub parameters: serde_json::Value,
    pub data: serde_json::Value,
    pub generated_by: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    DailyBookings,
    Revenue,
    TechnicianPerformance,
    AdPerformance,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::DailyBookings => "daily_bookings",
            ReportType::Revenue => "revenue",
            ReportType::TechnicianPerformance => "technician_performance",
            ReportType::AdPerformance => "ad_performance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily_bookings" => Some(ReportType::DailyBookings),
            "revenue" => Some(ReportType::Revenue),
            "technician_performance" => Some(ReportType::TechnicianPerformance),
            "ad_performance" => Some(ReportType::AdPerformance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBookings {
    pub date: NaiveDate,
    pub total_bookings: i64,
    pub by_status: BTreeMap<String, i64>,
    pub slots: Vec<SlotUtilization>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUtilization {
    pub time_slot_id: i64,
    pub start_time: String,
    pub max_capacity: i64,
    pub booked: i64,
    /// Percentage of capacity taken, 0-100.
    pub utilization: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueAnalysis {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_collected: f64,
    pub payment_count: i64,
    pub by_method: BTreeMap<String, f64>,
    pub booking_revenue: f64,
    pub advertising_revenue: f64,
    pub refunds_issued: f64,
    pub net_revenue: f64,
    pub outstanding_invoices: f64,
    pub by_service: Vec<ServiceRevenue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRevenue {
    pub name: String,
    pub bookings: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPerformance {
    pub technician_id: i64,
    pub name: String,
    pub assigned: i64,
    pub completed: i64,
    pub in_progress: i64,
    /// Percentage of assigned bookings completed, 0-100.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPerformance {
    pub advertisement_id: i64,
    pub title: String,
    pub status: String,
    pub impressions: i64,
    pub clicks: i64,
    /// Click-through rate as a percentage.
    pub ctr: f64,
    pub spend: f64,
}

/// `part / whole` as a percentage rounded to two places; zero when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
