//! Booking lifecycle: creation with slot capacity checks, updates, and cancellation with
//! tiered refunds. Every operation runs in a single transaction, so the booking, its invoice,
//! its tracking log and its history never diverge.

use chrono::{Duration, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::{
    Booking, BookingHistory, BookingStatus, Claims, CreateBooking, InvoiceOwner, Refund, RefundStatus, Role,
    TrackingStatus, UpdateBooking,
};
use crate::services::refunds::{RefundTier, REJECTION_REASON};
use crate::services::scheduling::{self, Window, PACKAGE_DURATION_MINUTES};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub booking: Booking,
    pub refund: Option<Refund>,
    pub refund_percentage: String,
}

/// Who may look at a booking: its customer, its assigned technician, and staff.
pub fn ensure_can_view(actor: &Claims, booking: &Booking) -> Result<(), AppError> {
    let allowed = match actor.role {
        Role::Manager | Role::Admin => true,
        Role::Customer => actor.customer_id == Some(booking.customer_id),
        Role::Technician => actor.technician_id.is_some() && actor.technician_id == booking.technician_id,
        Role::Advertiser => false,
    };
    if !allowed {
        return Err(AppError::forbidden("You do not have access to this booking"));
    }
    Ok(())
}

pub fn get_booking(conn: &Connection, actor: &Claims, id: i64) -> Result<Booking, AppError> {
    let booking = load(conn, id)?;
    ensure_can_view(actor, &booking)?;
    Ok(booking)
}

/// Audit trail of a booking, oldest first.
pub fn booking_history(conn: &Connection, actor: &Claims, id: i64) -> Result<Vec<BookingHistory>, AppError> {
    let booking = get_booking(conn, actor, id)?;
    Ok(queries::list_history(conn, booking.id)?)
}

pub fn list_bookings(
    conn: &Connection,
    actor: &Claims,
    status: Option<&str>,
) -> Result<Vec<Booking>, AppError> {
    let mut filter = BookingFilter {
        status: status.map(parse_status).transpose()?,
        ..Default::default()
    };

    match actor.role {
        Role::Manager | Role::Admin => {}
        Role::Customer => filter.customer_id = Some(own_customer_id(actor)?),
        Role::Technician => {
            filter.technician_id = Some(
                actor
                    .technician_id
                    .ok_or_else(|| AppError::forbidden("Token carries no technician profile"))?,
            )
        }
        Role::Advertiser => return Err(AppError::forbidden("Advertisers have no bookings")),
    }

    Ok(queries::list_bookings(conn, &filter)?)
}

pub fn create_booking(
    conn: &mut Connection,
    actor: &Claims,
    req: CreateBooking,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let customer_id = match actor.role {
        Role::Customer => own_customer_id(actor)?,
        Role::Manager | Role::Admin => req.customer_id.ok_or_else(|| {
            AppError::validation("Missing required fields: customerId")
        })?,
        _ => return Err(AppError::forbidden("Only customers and staff can create bookings")),
    };

    let missing: Vec<&str> = [
        ("date", req.date.is_none()),
        ("timeSlotId", req.time_slot_id.is_none()),
        ("vehicleId", req.vehicle_id.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    let (Some(date), Some(time_slot_id), Some(vehicle_id)) = (req.date, req.time_slot_id, req.vehicle_id)
    else {
        return Err(AppError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    let offering = match (req.service_id, req.service_package_id) {
        (Some(id), None) => Offering::Service(id),
        (None, Some(id)) => Offering::Package(id),
        _ => {
            return Err(AppError::validation(
                "Provide exactly one of serviceId or servicePackageId",
            ))
        }
    };

    // Immediate: the capacity count and the insert must not interleave with another writer.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let slot = scheduling::active_slot(&tx, time_slot_id)?;

    queries::get_customer(&tx, customer_id)?.ok_or_else(|| AppError::not_found("Customer not found"))?;
    let vehicle = queries::get_vehicle(&tx, vehicle_id)?.ok_or_else(|| AppError::not_found("Vehicle not found"))?;
    if vehicle.customer_id != customer_id {
        return Err(AppError::validation("Vehicle does not belong to this customer"));
    }

    let (duration_minutes, price) = offering.resolve(&tx)?;
    let window = Window::new(date, slot.start_time, Duration::minutes(duration_minutes));
    scheduling::ensure_future(&window, &now)?;
    scheduling::ensure_capacity(&tx, &slot, &date, None)?;

    let mut booking = Booking {
        id: 0,
        date,
        start_time: slot.start_time,
        end_date: window.end.date(),
        end_time: window.end.time(),
        status: BookingStatus::Pending,
        ref_number: scheduling::generate_ref_number(&now),
        customer_id,
        vehicle_id,
        service_id: req.service_id,
        service_package_id: req.service_package_id,
        technician_id: None,
        time_slot_id,
        customer_notes: req.customer_notes,
        technician_notes: None,
        created_at: now,
        updated_at: now,
    };
    booking.id = queries::insert_booking(&tx, &booking)?;

    queries::insert_invoice(&tx, InvoiceOwner::Booking(booking.id), price, &now)?;
    queries::insert_tracking(&tx, booking.id, TrackingStatus::Booked, None, &now)?;
    queries::insert_history(&tx, booking.id, actor.user_id, "created", &now)?;

    tx.commit()?;

    tracing::info!(
        booking = booking.id,
        ref_number = %booking.ref_number,
        %date,
        slot = time_slot_id,
        "booking created"
    );
    Ok(booking)
}

pub fn update_booking(
    conn: &mut Connection,
    actor: &Claims,
    id: i64,
    req: UpdateBooking,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let new_status = req.status.as_deref().map(parse_status).transpose()?;
    if new_status == Some(BookingStatus::Cancelled) {
        return Err(AppError::validation(
            "Use the cancellation endpoint to cancel a booking",
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut booking = load(&tx, id)?;
    ensure_can_modify(actor, &booking, &req)?;

    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::validation("Cancelled bookings cannot be modified"));
    }

    let mut actions: Vec<String> = vec![];
    let previous_status = booking.status;

    if let Some(status) = new_status.filter(|s| *s != booking.status) {
        if !booking.status.can_transition(status) {
            return Err(AppError::validation(format!(
                "Cannot change a {} booking to {}",
                booking.status.as_str(),
                status.as_str()
            )));
        }
        actions.push(format!(
            "status changed from {} to {}",
            booking.status.as_str(),
            status.as_str()
        ));
        booking.status = status;
    }

    if let Some(technician_id) = req.technician_id.filter(|t| Some(*t) != booking.technician_id) {
        queries::get_technician(&tx, technician_id)?
            .ok_or_else(|| AppError::not_found("Technician not found"))?;
        actions.push(format!("technician {technician_id} assigned"));
        booking.technician_id = Some(technician_id);
    }

    if req.touches_schedule() {
        let date = req.date.unwrap_or(booking.date);
        let time_slot_id = req.time_slot_id.unwrap_or(booking.time_slot_id);

        if date != booking.date || time_slot_id != booking.time_slot_id {
            let slot = scheduling::active_slot(&tx, time_slot_id)?;
            scheduling::ensure_capacity(&tx, &slot, &date, Some(booking.id))?;

            // Keep the originally booked duration rather than re-reading the catalog.
            let window = Window::new(date, slot.start_time, booking.duration());
            scheduling::ensure_future(&window, &now)?;

            booking.date = date;
            booking.time_slot_id = time_slot_id;
            booking.start_time = slot.start_time;
            booking.end_date = window.end.date();
            booking.end_time = window.end.time();
            actions.push(format!(
                "rescheduled to {} {}",
                date,
                slot.start_time.format("%H:%M")
            ));
        }
    }

    if let Some(notes) = req.customer_notes.filter(|n| Some(n) != booking.customer_notes.as_ref()) {
        booking.customer_notes = Some(notes);
        actions.push("customer notes updated".to_string());
    }
    if let Some(notes) = req.technician_notes.filter(|n| Some(n) != booking.technician_notes.as_ref()) {
        booking.technician_notes = Some(notes);
        actions.push("technician notes updated".to_string());
    }

    if actions.is_empty() {
        return Ok(booking);
    }

    booking.updated_at = now;
    queries::update_booking(&tx, &booking)?;
    queries::insert_history(&tx, booking.id, actor.user_id, &actions.join("; "), &now)?;

    if booking.status != previous_status {
        queries::insert_tracking(&tx, booking.id, booking.status.into(), None, &now)?;

        if booking.status == BookingStatus::Rejected {
            if let Some(invoice) = queries::get_paid_invoice_for_booking(&tx, booking.id)? {
                let already_refunded = queries::list_refunds_for_invoice(&tx, invoice.id)?
                    .iter()
                    .any(|r| r.status != RefundStatus::Rejected);
                if !already_refunded {
                    queries::insert_refund(&tx, invoice.id, invoice.amount, REJECTION_REASON, &now)?;
                    tracing::info!(booking = booking.id, amount = invoice.amount, "refund issued for rejected booking");
                }
            }
        }
    }

    tx.commit()?;

    tracing::info!(booking = booking.id, user = actor.user_id, actions = %actions.join("; "), "booking updated");
    Ok(booking)
}

pub fn cancel_booking(
    conn: &mut Connection,
    actor: &Claims,
    id: i64,
    now: NaiveDateTime,
) -> Result<Cancellation, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut booking = load(&tx, id)?;

    match actor.role {
        Role::Manager | Role::Admin => {}
        Role::Customer => {
            if actor.customer_id != Some(booking.customer_id) {
                return Err(AppError::forbidden("You do not have access to this booking"));
            }
        }
        _ => return Err(AppError::forbidden("Only customers and staff can cancel bookings")),
    }

    match booking.status {
        BookingStatus::Completed | BookingStatus::Rejected => {
            return Err(AppError::validation(format!(
                "Cannot cancel a {} booking",
                booking.status.as_str()
            )))
        }
        BookingStatus::Cancelled => return Err(AppError::validation("Booking is already cancelled")),
        BookingStatus::InProgress if actor.role == Role::Customer => {
            return Err(AppError::forbidden(
                "Customers may only cancel pending or accepted bookings",
            ))
        }
        _ => {}
    }

    let tier = RefundTier::for_notice(&booking.starts_at(), &now);

    booking.status = BookingStatus::Cancelled;
    booking.updated_at = now;
    queries::update_booking_status(&tx, booking.id, BookingStatus::Cancelled, &now)?;
    queries::insert_tracking(&tx, booking.id, TrackingStatus::Cancelled, None, &now)?;

    let mut refund = None;
    if tier != RefundTier::None {
        if let Some(invoice) = queries::get_paid_invoice_for_booking(&tx, booking.id)? {
            let refund_id = queries::insert_refund(&tx, invoice.id, tier.amount_of(invoice.amount), tier.reason(), &now)?;
            refund = queries::get_refund(&tx, refund_id)?;
        }
    }

    queries::insert_history(&tx, booking.id, actor.user_id, "cancelled", &now)?;
    tx.commit()?;

    tracing::info!(
        booking = booking.id,
        user = actor.user_id,
        refund = tier.percent(),
        "booking cancelled"
    );

    Ok(Cancellation {
        booking,
        refund,
        refund_percentage: tier.display(),
    })
}

enum Offering {
    Service(i64),
    Package(i64),
}

impl Offering {
    /// Duration in minutes and price of the booked offering.
    fn resolve(&self, conn: &Connection) -> Result<(i64, f64), AppError> {
        match *self {
            Offering::Service(id) => {
                let service = queries::get_service(conn, id)?
                    .filter(|s| s.is_active)
                    .ok_or_else(|| AppError::not_found("Service not found"))?;
                Ok((service.duration_minutes, service.price))
            }
            Offering::Package(id) => {
                let package = queries::get_package(conn, id)?
                    .filter(|p| p.is_active)
                    .ok_or_else(|| AppError::not_found("Service package not found"))?;
                Ok((PACKAGE_DURATION_MINUTES, package.price))
            }
        }
    }
}

fn ensure_can_modify(actor: &Claims, booking: &Booking, req: &UpdateBooking) -> Result<(), AppError> {
    match actor.role {
        Role::Manager | Role::Admin => Ok(()),
        Role::Customer => {
            if actor.customer_id != Some(booking.customer_id) {
                return Err(AppError::forbidden("You do not have access to this booking"));
            }
            if booking.status != BookingStatus::Pending {
                return Err(AppError::forbidden(
                    "Booking can no longer be modified once it has been processed",
                ));
            }
            if req.status.is_some() || req.technician_id.is_some() || req.technician_notes.is_some() {
                return Err(AppError::forbidden(
                    "Customers may only change the date, time slot or their notes",
                ));
            }
            Ok(())
        }
        Role::Technician => {
            if actor.technician_id.is_none() || actor.technician_id != booking.technician_id {
                return Err(AppError::forbidden("Booking is not assigned to you"));
            }
            if req.technician_id.is_some() || req.touches_schedule() || req.customer_notes.is_some() {
                return Err(AppError::forbidden(
                    "Technicians may only change the status or technician notes",
                ));
            }
            Ok(())
        }
        Role::Advertiser => Err(AppError::forbidden("Advertisers cannot modify bookings")),
    }
}

fn own_customer_id(actor: &Claims) -> Result<i64, AppError> {
    actor
        .customer_id
        .ok_or_else(|| AppError::forbidden("Token carries no customer profile"))
}

fn parse_status(s: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(s.trim()).ok_or_else(|| AppError::validation(format!("Invalid status: {s}")))
}

fn load(conn: &Connection, id: i64) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Booking not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::catalog::{NewService, NewTimeSlot};

    struct Fixture {
        conn: Connection,
        customer: Claims,
        manager: Claims,
        vehicle_id: i64,
        slot_id: i64,
        service_id: i64,
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn claims(user_id: i64, role: Role) -> Claims {
        Claims {
            user_id,
            role,
            customer_id: None,
            technician_id: None,
            advertiser_id: None,
            exp: i64::MAX,
        }
    }

    fn setup(capacity: i64) -> Fixture {
        let conn = db::init_db(":memory:").unwrap();
        let customer_id = queries::insert_customer(&conn, 1, "Ann", None, None).unwrap();
        let vehicle_id = queries::insert_vehicle(&conn, customer_id, "Toyota", "Corolla", "CAB-1234").unwrap();
        let slot_id = queries::insert_time_slot(
            &conn,
            &NewTimeSlot {
                start_time: "09:00".to_string(),
                max_capacity: capacity,
            },
        )
        .unwrap();
        let service_id = queries::insert_service(
            &conn,
            &NewService {
                name: "Full service".to_string(),
                description: None,
                category: Some("maintenance".to_string()),
                duration_minutes: 60,
                price: 2500.0,
            },
        )
        .unwrap();

        let mut customer = claims(1, Role::Customer);
        customer.customer_id = Some(customer_id);

        Fixture {
            conn,
            customer,
            manager: claims(99, Role::Manager),
            vehicle_id,
            slot_id,
            service_id,
        }
    }

    fn request(f: &Fixture, date: &str) -> CreateBooking {
        CreateBooking {
            date: Some(date.parse().unwrap()),
            time_slot_id: Some(f.slot_id),
            vehicle_id: Some(f.vehicle_id),
            service_id: Some(f.service_id),
            ..Default::default()
        }
    }

    fn pay(conn: &Connection, booking_id: i64) {
        let invoice = queries::get_invoice_for(conn, InvoiceOwner::Booking(booking_id))
            .unwrap()
            .unwrap();
        assert!(queries::mark_invoice_paid(conn, invoice.id).unwrap());
    }

    #[test]
    fn test_create_writes_booking_invoice_tracking_history() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.end_time.format("%H:%M").to_string(), "10:00");
        assert_eq!(booking.duration(), Duration::minutes(60));
        assert!(booking.ref_number.starts_with("SL-20250601-"));

        let invoice = queries::get_invoice_for(&f.conn, InvoiceOwner::Booking(booking.id))
            .unwrap()
            .unwrap();
        assert_eq!(invoice.amount, 2500.0);

        let tracking = queries::list_tracking(&f.conn, booking.id).unwrap();
        assert_eq!(tracking.len(), 1);
        assert_eq!(tracking[0].status, TrackingStatus::Booked);

        let history = queries::list_history(&f.conn, booking.id).unwrap();
        assert_eq!(history[0].action, "created");
        assert_eq!(history[0].user_id, 1);
    }

    #[test]
    fn test_capacity_enforced_per_date_and_slot() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let now = dt("2025-06-01 08:00");

        for _ in 0..2 {
            let req = request(&f, "2025-06-16");
            create_booking(&mut f.conn, &customer, req, now).unwrap();
        }
        let req = request(&f, "2025-06-16");
        let err = create_booking(&mut f.conn, &customer, req, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("fully booked")));

        // A different date has its own capacity.
        let req = request(&f, "2025-06-17");
        assert!(create_booking(&mut f.conn, &customer, req, now).is_ok());
    }

    #[test]
    fn test_rejected_booking_frees_its_place() {
        let mut f = setup(1);
        let customer = f.customer.clone();
        let manager = f.manager.clone();
        let now = dt("2025-06-01 08:00");

        let req = request(&f, "2025-06-16");
        let first = create_booking(&mut f.conn, &customer, req, now).unwrap();
        let update = UpdateBooking {
            status: Some("rejected".to_string()),
            ..Default::default()
        };
        update_booking(&mut f.conn, &manager, first.id, update, now).unwrap();

        let req = request(&f, "2025-06-16");
        assert!(create_booking(&mut f.conn, &customer, req, now).is_ok());
    }

    #[test]
    fn test_create_requires_exactly_one_offering() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let mut req = request(&f, "2025-06-16");
        req.service_package_id = Some(1);
        let err = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut req = request(&f, "2025-06-16");
        req.service_id = None;
        let err = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_create_lists_missing_fields() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let req = CreateBooking {
            service_id: Some(f.service_id),
            ..Default::default()
        };
        let err = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: date, timeSlotId, vehicleId"
        );
    }

    #[test]
    fn test_create_rejects_foreign_vehicle() {
        let mut f = setup(2);
        let other = queries::insert_customer(&f.conn, 2, "Bob", None, None).unwrap();
        let foreign = queries::insert_vehicle(&f.conn, other, "Honda", "Civic", "XY-1").unwrap();
        let customer = f.customer.clone();
        let mut req = request(&f, "2025-06-16");
        req.vehicle_id = Some(foreign);
        let err = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_package_booking_lasts_two_hours_across_midnight() {
        let mut f = setup(2);
        let late = queries::insert_time_slot(
            &f.conn,
            &NewTimeSlot {
                start_time: "23:00".to_string(),
                max_capacity: 1,
            },
        )
        .unwrap();
        let package = queries::insert_package(&f.conn, "Winter check", None, 4000.0).unwrap();
        let customer = f.customer.clone();
        let req = CreateBooking {
            date: Some("2025-06-16".parse().unwrap()),
            time_slot_id: Some(late),
            vehicle_id: Some(f.vehicle_id),
            service_package_id: Some(package),
            ..Default::default()
        };
        let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();
        assert_eq!(booking.end_date.to_string(), "2025-06-17");
        assert_eq!(booking.end_time.format("%H:%M").to_string(), "01:00");
        assert_eq!(booking.duration(), Duration::minutes(PACKAGE_DURATION_MINUTES));
    }

    #[test]
    fn test_customer_cannot_modify_after_pending() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let manager = f.manager.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();

        let accept = UpdateBooking {
            status: Some("accepted".to_string()),
            ..Default::default()
        };
        update_booking(&mut f.conn, &manager, booking.id, accept, now).unwrap();

        let notes = UpdateBooking {
            customer_notes: Some("please wash".to_string()),
            ..Default::default()
        };
        let err = update_booking(&mut f.conn, &customer, booking.id, notes.clone(), now).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Staff are not restricted.
        let updated = update_booking(&mut f.conn, &manager, booking.id, notes, now).unwrap();
        assert_eq!(updated.customer_notes.as_deref(), Some("please wash"));
    }

    #[test]
    fn test_update_rejects_cancelled_status() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let manager = f.manager.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();

        let update = UpdateBooking {
            status: Some("cancelled".to_string()),
            ..Default::default()
        };
        let err = update_booking(&mut f.conn, &manager, booking.id, update, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_reschedule_preserves_duration() {
        let mut f = setup(2);
        let afternoon = queries::insert_time_slot(
            &f.conn,
            &NewTimeSlot {
                start_time: "14:30".to_string(),
                max_capacity: 1,
            },
        )
        .unwrap();
        let customer = f.customer.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();

        // A catalog change after booking must not affect the booked duration.
        f.conn
            .execute("UPDATE services SET duration_minutes = 180", [])
            .unwrap();

        let update = UpdateBooking {
            time_slot_id: Some(afternoon),
            date: Some("2025-06-18".parse().unwrap()),
            ..Default::default()
        };
        let moved = update_booking(&mut f.conn, &customer, booking.id, update, now).unwrap();
        assert_eq!(moved.start_time.format("%H:%M").to_string(), "14:30");
        assert_eq!(moved.end_time.format("%H:%M").to_string(), "15:30");
        assert_eq!(moved.date.to_string(), "2025-06-18");

        let history = queries::list_history(&f.conn, booking.id).unwrap();
        assert!(history.last().unwrap().action.contains("rescheduled"));
    }

    #[test]
    fn test_reschedule_into_full_slot_fails() {
        let mut f = setup(1);
        let customer = f.customer.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        create_booking(&mut f.conn, &customer, req, now).unwrap();
        let req = request(&f, "2025-06-17");
        let second = create_booking(&mut f.conn, &customer, req, now).unwrap();

        let update = UpdateBooking {
            date: Some("2025-06-16".parse().unwrap()),
            ..Default::default()
        };
        let err = update_booking(&mut f.conn, &customer, second.id, update, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("fully booked")));
    }

    #[test]
    fn test_reject_paid_booking_issues_full_refund() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let manager = f.manager.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();
        pay(&f.conn, booking.id);

        let update = UpdateBooking {
            status: Some("rejected".to_string()),
            ..Default::default()
        };
        update_booking(&mut f.conn, &manager, booking.id, update, now).unwrap();

        let refunds = queries::list_refunds(&f.conn, None).unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].amount, 2500.0);
        assert_eq!(refunds[0].reason, REJECTION_REASON);
        assert_eq!(refunds[0].status, RefundStatus::Pending);

        let tracking = queries::list_tracking(&f.conn, booking.id).unwrap();
        assert_eq!(tracking.last().unwrap().status, TrackingStatus::Rejected);
    }

    fn set_status(f: &mut Fixture, id: i64, status: &str) -> Result<Booking, AppError> {
        let manager = f.manager.clone();
        let update = UpdateBooking {
            status: Some(status.to_string()),
            ..Default::default()
        };
        update_booking(&mut f.conn, &manager, id, update, dt("2025-06-02 08:00"))
    }

    #[test]
    fn test_rejected_booking_cannot_reclaim_its_place() {
        let mut f = setup(1);
        let customer = f.customer.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let first = create_booking(&mut f.conn, &customer, req.clone(), now).unwrap();
        set_status(&mut f, first.id, "rejected").unwrap();
        create_booking(&mut f.conn, &customer, req, now).unwrap();

        for status in ["pending", "accepted", "in_progress", "completed"] {
            let err = set_status(&mut f, first.id, status).unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m.contains("Cannot change a rejected")));
        }

        let date = "2025-06-16".parse().unwrap();
        assert_eq!(queries::count_slot_bookings(&f.conn, &date, f.slot_id, None).unwrap(), 1);
        let first = queries::get_booking_by_id(&f.conn, first.id).unwrap().unwrap();
        assert_eq!(first.status, BookingStatus::Rejected);
    }

    #[test]
    fn test_completed_booking_status_is_final() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();
        set_status(&mut f, booking.id, "completed").unwrap();

        assert!(matches!(set_status(&mut f, booking.id, "pending"), Err(AppError::Validation(_))));
        assert!(matches!(set_status(&mut f, booking.id, "rejected"), Err(AppError::Validation(_))));

        // Notes on a finished job are still accepted.
        let manager = f.manager.clone();
        let update = UpdateBooking {
            technician_notes: Some("Replaced filter".to_string()),
            ..Default::default()
        };
        let updated = update_booking(&mut f.conn, &manager, booking.id, update, dt("2025-06-02 08:00")).unwrap();
        assert_eq!(updated.status, BookingStatus::Completed);
        assert_eq!(updated.technician_notes.as_deref(), Some("Replaced filter"));
    }

    #[test]
    fn test_repeated_rejection_refunds_once() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();
        pay(&f.conn, booking.id);

        set_status(&mut f, booking.id, "rejected").unwrap();
        assert!(set_status(&mut f, booking.id, "accepted").is_err());
        set_status(&mut f, booking.id, "rejected").unwrap();

        let refunds = queries::list_refunds(&f.conn, None).unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds.iter().map(|r| r.amount).sum::<f64>(), 2500.0);
    }

    #[test]
    fn test_rejection_skips_refund_when_invoice_already_refunded() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();
        pay(&f.conn, booking.id);
        let invoice = queries::get_paid_invoice_for_booking(&f.conn, booking.id).unwrap().unwrap();
        queries::insert_refund(&f.conn, invoice.id, 2500.0, "Goodwill", &dt("2025-06-01 09:00")).unwrap();

        set_status(&mut f, booking.id, "rejected").unwrap();

        let refunds = queries::list_refunds_for_invoice(&f.conn, invoice.id).unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].reason, "Goodwill");
    }

    #[test]
    fn test_cancel_tiers() {
        let cases = [
            ("2025-06-15 03:00", Some(2500.0), "100%"),
            ("2025-06-15 21:00", Some(1250.0), "50%"),
            ("2025-06-16 10:00", None, "0%"),
        ];

        for (now, expected_refund, percentage) in cases {
            let mut f = setup(2);
            let customer = f.customer.clone();
            let manager = f.manager.clone();
            let req = request(&f, "2025-06-16");
            let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();
            pay(&f.conn, booking.id);

            let result = cancel_booking(&mut f.conn, &manager, booking.id, dt(now)).unwrap();
            assert_eq!(result.refund_percentage, percentage);
            assert_eq!(result.booking.status, BookingStatus::Cancelled);
            assert_eq!(result.refund.as_ref().map(|r| r.amount), expected_refund);
            assert_eq!(
                queries::list_refunds(&f.conn, None).unwrap().len(),
                usize::from(expected_refund.is_some())
            );

            let history = queries::list_history(&f.conn, booking.id).unwrap();
            assert_eq!(history.last().unwrap().action, "cancelled");
        }
    }

    #[test]
    fn test_cancel_unpaid_booking_creates_no_refund() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, dt("2025-06-01 08:00")).unwrap();

        let result = cancel_booking(&mut f.conn, &customer, booking.id, dt("2025-06-10 08:00")).unwrap();
        assert_eq!(result.refund_percentage, "100%");
        assert!(result.refund.is_none());
    }

    #[test]
    fn test_cancel_status_rules() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let manager = f.manager.clone();
        let now = dt("2025-06-01 08:00");

        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();
        let update = UpdateBooking {
            status: Some("in_progress".to_string()),
            ..Default::default()
        };
        update_booking(&mut f.conn, &manager, booking.id, update, now).unwrap();

        let err = cancel_booking(&mut f.conn, &customer, booking.id, now).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let update = UpdateBooking {
            status: Some("completed".to_string()),
            ..Default::default()
        };
        update_booking(&mut f.conn, &manager, booking.id, update, now).unwrap();
        let err = cancel_booking(&mut f.conn, &manager, booking.id, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_cancel_twice_fails() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();

        cancel_booking(&mut f.conn, &customer, booking.id, now).unwrap();
        let err = cancel_booking(&mut f.conn, &customer, booking.id, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_visibility() {
        let mut f = setup(2);
        let customer = f.customer.clone();
        let now = dt("2025-06-01 08:00");
        let req = request(&f, "2025-06-16");
        let booking = create_booking(&mut f.conn, &customer, req, now).unwrap();

        let mut stranger = claims(5, Role::Customer);
        stranger.customer_id = Some(12345);
        assert!(matches!(
            get_booking(&f.conn, &stranger, booking.id),
            Err(AppError::Forbidden(_))
        ));
        assert!(get_booking(&f.conn, &customer, booking.id).is_ok());
        assert!(list_bookings(&f.conn, &stranger, None).unwrap().is_empty());
        assert_eq!(list_bookings(&f.conn, &f.manager, Some("pending")).unwrap().len(), 1);
    }
}
