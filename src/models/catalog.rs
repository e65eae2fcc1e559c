use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::booking::hhmm;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePackage {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub service_ids: Vec<i64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: i64,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub max_capacity: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServicePackage {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub service_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeSlot {
    pub start_time: String,
    pub max_capacity: i64,
}
