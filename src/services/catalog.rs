use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::advertisement::NewPlacement;
use crate::models::booking::hhmm;
use crate::models::catalog::{NewService, NewServicePackage, NewTimeSlot};
use crate::models::{Claims, Placement, Service, ServicePackage, TimeSlot};

pub fn create_service(conn: &Connection, actor: &Claims, req: NewService) -> Result<Service, AppError> {
    require_staff(actor)?;
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Service name is required"));
    }
    if req.duration_minutes <= 0 {
        return Err(AppError::validation("durationMinutes must be positive"));
    }
    ensure_price(req.price)?;

    let id = queries::insert_service(conn, &req)?;
    tracing::info!(service = id, name = %req.name, "service created");
    queries::get_service(conn, id)?.ok_or_else(|| AppError::not_found("Service not found"))
}

/// Inserts a package together with its service links. Unknown service ids abort the whole insert.
pub fn create_package(
    conn: &mut Connection,
    actor: &Claims,
    req: NewServicePackage,
) -> Result<ServicePackage, AppError> {
    require_staff(actor)?;
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Package name is required"));
    }
    ensure_price(req.price)?;

    let tx = conn.transaction()?;
    let id = queries::insert_package(&tx, &req.name, req.description.as_deref(), req.price)?;
    for service_id in &req.service_ids {
        if queries::get_service(&tx, *service_id)?.is_none() {
            return Err(AppError::validation(format!("Unknown service id: {service_id}")));
        }
        queries::link_package_service(&tx, id, *service_id)?;
    }
    let package = queries::get_package(&tx, id)?.ok_or_else(|| AppError::not_found("Service package not found"))?;
    tx.commit()?;

    tracing::info!(package = id, services = package.service_ids.len(), "service package created");
    Ok(package)
}

pub fn create_time_slot(conn: &Connection, actor: &Claims, req: NewTimeSlot) -> Result<TimeSlot, AppError> {
    require_staff(actor)?;
    if hhmm::parse(&req.start_time).is_none() {
        return Err(AppError::validation("startTime must be HH:MM"));
    }
    if req.max_capacity <= 0 {
        return Err(AppError::validation("maxCapacity must be positive"));
    }

    let id = queries::insert_time_slot(conn, &req)?;
    tracing::info!(slot = id, start = %req.start_time, capacity = req.max_capacity, "time slot created");
    queries::get_time_slot(conn, id)?.ok_or_else(|| AppError::not_found("Time slot not found"))
}

/// Retires or restores a slot. Existing bookings on it are untouched.
pub fn set_time_slot_active(conn: &Connection, actor: &Claims, id: i64, active: bool) -> Result<TimeSlot, AppError> {
    require_staff(actor)?;
    if !queries::set_time_slot_active(conn, id, active)? {
        return Err(AppError::not_found("Time slot not found"));
    }
    tracing::info!(slot = id, active, "time slot availability changed");
    queries::get_time_slot(conn, id)?.ok_or_else(|| AppError::not_found("Time slot not found"))
}

pub fn create_placement(conn: &Connection, actor: &Claims, req: NewPlacement) -> Result<Placement, AppError> {
    require_staff(actor)?;
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Placement name is required"));
    }
    ensure_price(req.daily_rate)?;

    let id = queries::insert_placement(conn, &req)?;
    tracing::info!(placement = id, name = %req.name, "placement created");
    queries::get_placement(conn, id)?.ok_or_else(|| AppError::not_found("Placement not found"))
}

/// Staff see retired entries too; everyone else only what can be booked.
pub fn active_only(actor: &Claims) -> bool {
    !actor.is_staff()
}

fn ensure_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Price must be a non-negative number"));
    }
    Ok(())
}

pub(crate) fn require_staff(actor: &Claims) -> Result<(), AppError> {
    if !actor.is_staff() {
        return Err(AppError::forbidden("This action requires a manager or admin"));
    }
    Ok(())
}
