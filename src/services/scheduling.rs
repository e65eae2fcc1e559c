use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::TimeSlot;

/// Packages have no catalog duration of their own.
pub const PACKAGE_DURATION_MINUTES: i64 = 120;

/// A booking's occupied window. `end` may fall on a later date than `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(date: NaiveDate, start_time: NaiveTime, duration: Duration) -> Self {
        let start = date.and_time(start_time);
        Window {
            start,
            end: start + duration,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SchedulingError {
    SlotUnavailable,
    FullyBooked { capacity: i64 },
    InPast,
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::SlotUnavailable => write!(f, "Time slot not found or inactive"),
            SchedulingError::FullyBooked { capacity } => write!(
                f,
                "Time slot is fully booked for this date ({capacity} of {capacity} places taken)"
            ),
            SchedulingError::InPast => write!(f, "Cannot book a time slot in the past"),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::SlotUnavailable => AppError::NotFound(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

/// Loads a bookable slot: present and active.
pub fn active_slot(conn: &Connection, time_slot_id: i64) -> Result<TimeSlot, AppError> {
    queries::get_time_slot(conn, time_slot_id)?
        .filter(|slot| slot.is_active)
        .ok_or_else(|| SchedulingError::SlotUnavailable.into())
}

/// Fails when `(date, slot)` has no free place. `exclude` leaves a booking out of the count,
/// for rescheduling a booking that already holds a place.
pub fn ensure_capacity(
    conn: &Connection,
    slot: &TimeSlot,
    date: &NaiveDate,
    exclude: Option<i64>,
) -> Result<(), AppError> {
    let taken = queries::count_slot_bookings(conn, date, slot.id, exclude)?;
    if taken >= slot.max_capacity {
        tracing::info!(slot = slot.id, %date, taken, "time slot fully booked");
        return Err(SchedulingError::FullyBooked {
            capacity: slot.max_capacity,
        }
        .into());
    }
    Ok(())
}

pub fn ensure_future(window: &Window, now: &NaiveDateTime) -> Result<(), SchedulingError> {
    if window.start <= *now {
        return Err(SchedulingError::InPast);
    }
    Ok(())
}

/// `SL-YYYYMMDD-NNNN` with four random digits. Not guaranteed unique.
pub fn generate_ref_number(now: &NaiveDateTime) -> String {
    let digits = uuid::Uuid::new_v4().as_u128() % 10_000;
    format!("SL-{}-{digits:04}", now.format("%Y%m%d"))
}
