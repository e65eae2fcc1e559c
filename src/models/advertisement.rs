use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::blank;
use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub daily_rate: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlacement {
    pub name: String,
    pub location: String,
    pub daily_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub advertiser_id: i64,
    pub placement_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: AdStatus,
    pub impressions: i64,
    pub clicks: i64,
    pub created_at: NaiveDateTime,
}

impl Advertisement {
    /// Days billed, both ends inclusive.
    pub fn billed_days(&self) -> i64 {
        billed_days(self.start_date, self.end_date)
    }
}

pub fn billed_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pending,
    Active,
    Paused,
    Completed,
    Rejected,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Active => "active",
            AdStatus::Paused => "paused",
            AdStatus::Completed => "completed",
            AdStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AdStatus::Pending),
            "active" => Some(AdStatus::Active),
            "paused" => Some(AdStatus::Paused),
            "completed" => Some(AdStatus::Completed),
            "rejected" => Some(AdStatus::Rejected),
            _ => None,
        }
    }

    /// Manual transitions. `pending -> active` only happens through payment.
    pub fn can_transition(&self, next: AdStatus, role: Role) -> bool {
        use AdStatus::*;

        let pause_resume = matches!((self, next), (Active, Paused) | (Paused, Active));
        match role {
            Role::Advertiser => pause_resume,
            Role::Manager | Role::Admin => {
                pause_resume
                    || matches!(
                        (self, next),
                        (Pending, Rejected) | (Active, Completed) | (Paused, Completed)
                    )
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdvertisement {
    #[serde(default, deserialize_with = "blank::opt")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub advertiser_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub placement_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub end_date: Option<NaiveDate>,
}
