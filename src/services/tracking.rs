use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::tracking::TrackingUpdate;
use crate::models::{Claims, Role, ServiceTracking, TrackingStatus};
use crate::services::booking::ensure_can_view;

/// Appends a workshop-floor event and mirrors it onto the booking.
pub fn update_tracking(
    conn: &mut Connection,
    actor: &Claims,
    req: TrackingUpdate,
    now: NaiveDateTime,
) -> Result<ServiceTracking, AppError> {
    let (Some(booking_id), Some(status)) = (req.booking_id, req.status.as_deref()) else {
        return Err(AppError::validation("Missing required fields: bookingId, status"));
    };
    let status = TrackingStatus::parse(status.trim())
        .ok_or_else(|| AppError::validation(format!("Invalid tracking status: {status}")))?;
    if status.is_workflow_owned() {
        return Err(AppError::validation(format!(
            "Status {} is recorded by the booking and payment endpoints",
            status.as_str()
        )));
    }

    let tx = conn.transaction()?;
    let booking = queries::get_booking_by_id(&tx, booking_id)?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;

    let allowed = match actor.role {
        Role::Manager | Role::Admin => true,
        Role::Technician => actor.technician_id.is_some() && actor.technician_id == booking.technician_id,
        _ => false,
    };
    if !allowed {
        return Err(AppError::forbidden(
            "Only the assigned technician or a manager can update tracking",
        ));
    }
    if booking.status.is_terminal() {
        return Err(AppError::validation(format!(
            "Booking is {} and can no longer be tracked",
            booking.status.as_str()
        )));
    }

    let id = queries::insert_tracking(&tx, booking_id, status, req.note.as_deref(), &now)?;
    if let Some(mirrored) = status.mirrored_booking_status().filter(|s| *s != booking.status) {
        queries::update_booking_status(&tx, booking_id, mirrored, &now)?;
    }
    queries::insert_history(
        &tx,
        booking_id,
        actor.user_id,
        &format!("tracking: {}", status.as_str()),
        &now,
    )?;
    let entry = queries::get_tracking(&tx, id)?.ok_or_else(|| anyhow::anyhow!("tracking row {id} vanished"))?;
    tx.commit()?;

    tracing::info!(booking = booking_id, status = status.as_str(), user = actor.user_id, "tracking updated");
    Ok(entry)
}

pub fn tracking_history(
    conn: &Connection,
    actor: &Claims,
    booking_id: i64,
) -> Result<Vec<ServiceTracking>, AppError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    ensure_can_view(actor, &booking)?;
    Ok(queries::list_tracking(conn, booking_id)?)
}
