use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// Differs from `date` only when the service runs past midnight.
    pub end_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub ref_number: String,
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub service_id: Option<i64>,
    pub service_package_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub time_slot_id: i64,
    pub customer_notes: Option<String>,
    pub technician_notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.end_date.and_time(self.end_time)
    }

    pub fn duration(&self) -> Duration {
        self.ends_at() - self.starts_at()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// No further work happens on a booking in one of these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Rejected | BookingStatus::Cancelled
        )
    }

    /// Status changes allowed through a booking update. Terminal states are final and
    /// `cancelled` is only reached through cancellation.
    pub fn can_transition(&self, next: BookingStatus) -> bool {
        !self.is_terminal() && next != BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    #[serde(default, deserialize_with = "blank::opt")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub time_slot_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub customer_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub vehicle_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub service_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub service_package_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub customer_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBooking {
    #[serde(default, deserialize_with = "blank::opt")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub technician_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub time_slot_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub customer_notes: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub technician_notes: Option<String>,
}

impl UpdateBooking {
    pub fn touches_schedule(&self) -> bool {
        self.date.is_some() || self.time_slot_id.is_some()
    }
}

/// `HH:MM` wall-clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s.trim(), FORMAT).ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid time: {s}")))
    }
}
