use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::blank;
use crate::models::BookingStatus;

/// One entry in a booking's append-only status log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTracking {
    pub id: i64,
    pub status: TrackingStatus,
    pub booking_id: i64,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingHistory {
    pub id: i64,
    pub action: String,
    pub booking_id: i64,
    pub user_id: i64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Booked,
    Pending,
    PaymentReceived,
    Accepted,
    Started,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Booked => "booked",
            TrackingStatus::Pending => "pending",
            TrackingStatus::PaymentReceived => "payment_received",
            TrackingStatus::Accepted => "accepted",
            TrackingStatus::Started => "started",
            TrackingStatus::InProgress => "in_progress",
            TrackingStatus::Completed => "completed",
            TrackingStatus::Rejected => "rejected",
            TrackingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(TrackingStatus::Booked),
            "pending" => Some(TrackingStatus::Pending),
            "payment_received" => Some(TrackingStatus::PaymentReceived),
            "accepted" => Some(TrackingStatus::Accepted),
            "started" => Some(TrackingStatus::Started),
            "in_progress" => Some(TrackingStatus::InProgress),
            "completed" => Some(TrackingStatus::Completed),
            "rejected" => Some(TrackingStatus::Rejected),
            "cancelled" => Some(TrackingStatus::Cancelled),
            _ => None,
        }
    }

    /// The booking status a workshop-floor event moves the booking into, if any.
    pub fn mirrored_booking_status(&self) -> Option<BookingStatus> {
        match self {
            TrackingStatus::Completed => Some(BookingStatus::Completed),
            TrackingStatus::Started | TrackingStatus::InProgress => Some(BookingStatus::InProgress),
            _ => None,
        }
    }

    /// Statuses that belong to the booking, payment or cancellation flows.
    pub fn is_workflow_owned(&self) -> bool {
        matches!(
            self,
            TrackingStatus::Booked
                | TrackingStatus::PaymentReceived
                | TrackingStatus::Rejected
                | TrackingStatus::Cancelled
        )
    }
}

impl From<BookingStatus> for TrackingStatus {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => TrackingStatus::Pending,
            BookingStatus::Accepted => TrackingStatus::Accepted,
            BookingStatus::InProgress => TrackingStatus::InProgress,
            BookingStatus::Completed => TrackingStatus::Completed,
            BookingStatus::Rejected => TrackingStatus::Rejected,
            BookingStatus::Cancelled => TrackingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdate {
    #[serde(default, deserialize_with = "blank::opt")]
    pub booking_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub note: Option<String>,
}
