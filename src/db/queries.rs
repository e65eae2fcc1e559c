use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::models::advertisement::NewPlacement;
use crate::models::booking::hhmm;
use crate::models::catalog::{NewService, NewTimeSlot};
use crate::models::{
    AdStatus, Advertisement, Advertiser, Booking, BookingHistory, BookingStatus, Customer,
    Invoice, InvoiceOwner, InvoiceStatus, Payment, PaymentMethod, Placement, Refund,
    RefundStatus, Report, ReportType, Service, ServicePackage, ServiceTracking, Technician,
    TimeSlot, TrackingStatus, Vehicle,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn fmt_ts(dt: &NaiveDateTime) -> String {
    dt.format(TS_FORMAT).to_string()
}

pub fn fmt_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid timestamp {s:?}: {e}"))
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| anyhow::anyhow!("invalid date {s:?}: {e}"))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    hhmm::parse(s).ok_or_else(|| anyhow::anyhow!("invalid time {s:?}"))
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<anyhow::Result<T>>>,
) -> anyhow::Result<Vec<T>> {
    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}

fn optional_row<T>(result: rusqlite::Result<anyhow::Result<T>>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(item) => Ok(Some(item?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Customers, Vehicles, Technicians, Advertisers ──

pub fn insert_customer(
    conn: &Connection,
    user_id: i64,
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO customers (user_id, name, phone, email) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, phone, email],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_customer(conn: &Connection, id: i64) -> anyhow::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, user_id, name, phone, email FROM customers WHERE id = ?1",
        params![id],
        |row| {
            Ok(Ok(Customer {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                phone: row.get(3)?,
                email: row.get(4)?,
            }))
        },
    );
    optional_row(result)
}

pub fn list_customers(conn: &Connection) -> anyhow::Result<Vec<Customer>> {
    let mut stmt = conn.prepare("SELECT id, user_id, name, phone, email FROM customers ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Ok(Customer {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
        }))
    })?;
    collect_rows(rows)
}

pub fn insert_vehicle(
    conn: &Connection,
    customer_id: i64,
    make: &str,
    model: &str,
    plate: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO vehicles (customer_id, make, model, plate) VALUES (?1, ?2, ?3, ?4)",
        params![customer_id, make, model, plate],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_vehicle(conn: &Connection, id: i64) -> anyhow::Result<Option<Vehicle>> {
    let result = conn.query_row(
        "SELECT id, customer_id, make, model, plate FROM vehicles WHERE id = ?1",
        params![id],
        |row| Ok(Ok(parse_vehicle_row(row)?)),
    );
    optional_row(result)
}

pub fn list_vehicles_for_customer(conn: &Connection, customer_id: i64) -> anyhow::Result<Vec<Vehicle>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_id, make, model, plate FROM vehicles WHERE customer_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![customer_id], |row| Ok(Ok(parse_vehicle_row(row)?)))?;
    collect_rows(rows)
}

fn parse_vehicle_row(row: &rusqlite::Row) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        make: row.get(2)?,
        model: row.get(3)?,
        plate: row.get(4)?,
    })
}

pub fn insert_technician(
    conn: &Connection,
    user_id: i64,
    name: &str,
    specialization: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO technicians (user_id, name, specialization) VALUES (?1, ?2, ?3)",
        params![user_id, name, specialization],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_technician(conn: &Connection, id: i64) -> anyhow::Result<Option<Technician>> {
    let result = conn.query_row(
        "SELECT id, user_id, name, specialization FROM technicians WHERE id = ?1",
        params![id],
        |row| {
            Ok(Ok(Technician {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                specialization: row.get(3)?,
            }))
        },
    );
    optional_row(result)
}

pub fn list_technicians(conn: &Connection) -> anyhow::Result<Vec<Technician>> {
    let mut stmt =
        conn.prepare("SELECT id, user_id, name, specialization FROM technicians ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Ok(Technician {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            specialization: row.get(3)?,
        }))
    })?;
    collect_rows(rows)
}

pub fn insert_advertiser(conn: &Connection, user_id: i64, company_name: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO advertisers (user_id, company_name) VALUES (?1, ?2)",
        params![user_id, company_name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_advertiser(conn: &Connection, id: i64) -> anyhow::Result<Option<Advertiser>> {
    let result = conn.query_row(
        "SELECT id, user_id, company_name FROM advertisers WHERE id = ?1",
        params![id],
        |row| {
            Ok(Ok(Advertiser {
                id: row.get(0)?,
                user_id: row.get(1)?,
                company_name: row.get(2)?,
            }))
        },
    );
    optional_row(result)
}

// ── Catalog ──

const SERVICE_COLUMNS: &str = "id, name, description, category, duration_minutes, price, is_active";

pub fn insert_service(conn: &Connection, service: &NewService) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO services (name, description, category, duration_minutes, price) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.name,
            service.description,
            service.category,
            service.duration_minutes,
            service.price,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_service(conn: &Connection, id: i64) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
        params![id],
        |row| Ok(Ok(parse_service_row(row)?)),
    );
    optional_row(result)
}

pub fn list_services(conn: &Connection, active_only: bool) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 OR ?1 = 0 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![active_only], |row| Ok(Ok(parse_service_row(row)?)))?;
    collect_rows(rows)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        duration_minutes: row.get(4)?,
        price: row.get(5)?,
        is_active: row.get(6)?,
    })
}

pub fn insert_package(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    price: f64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO service_packages (name, description, price) VALUES (?1, ?2, ?3)",
        params![name, description, price],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn link_package_service(conn: &Connection, package_id: i64, service_id: i64) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO package_services (package_id, service_id) VALUES (?1, ?2)",
        params![package_id, service_id],
    )?;
    Ok(())
}

pub fn get_package(conn: &Connection, id: i64) -> anyhow::Result<Option<ServicePackage>> {
    let result = conn.query_row(
        "SELECT id, name, description, price, is_active FROM service_packages WHERE id = ?1",
        params![id],
        |row| Ok(Ok(parse_package_row(row)?)),
    );
    match optional_row(result)? {
        Some(mut package) => {
            package.service_ids = package_service_ids(conn, package.id)?;
            Ok(Some(package))
        }
        None => Ok(None),
    }
}

pub fn list_packages(conn: &Connection, active_only: bool) -> anyhow::Result<Vec<ServicePackage>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price, is_active FROM service_packages
         WHERE is_active = 1 OR ?1 = 0 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![active_only], |row| Ok(Ok(parse_package_row(row)?)))?;
    let mut packages = collect_rows(rows)?;
    for package in &mut packages {
        package.service_ids = package_service_ids(conn, package.id)?;
    }
    Ok(packages)
}

fn package_service_ids(conn: &Connection, package_id: i64) -> anyhow::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT service_id FROM package_services WHERE package_id = ?1 ORDER BY service_id ASC",
    )?;
    let rows = stmt.query_map(params![package_id], |row| row.get(0))?;
    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn parse_package_row(row: &rusqlite::Row) -> rusqlite::Result<ServicePackage> {
    Ok(ServicePackage {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        service_ids: vec![],
        is_active: row.get(4)?,
    })
}

pub fn insert_time_slot(conn: &Connection, slot: &NewTimeSlot) -> anyhow::Result<i64> {
    let start = parse_time(&slot.start_time)?;
    conn.execute(
        "INSERT INTO time_slots (start_time, max_capacity) VALUES (?1, ?2)",
        params![start.format(hhmm::FORMAT).to_string(), slot.max_capacity],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_time_slot_active(conn: &Connection, id: i64, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE time_slots SET is_active = ?1 WHERE id = ?2",
        params![active, id],
    )?;
    Ok(count > 0)
}

pub fn get_time_slot(conn: &Connection, id: i64) -> anyhow::Result<Option<TimeSlot>> {
    let result = conn.query_row(
        "SELECT id, start_time, max_capacity, is_active FROM time_slots WHERE id = ?1",
        params![id],
        |row| Ok(parse_time_slot_row(row)),
    );
    optional_row(result)
}

pub fn list_time_slots(conn: &Connection, active_only: bool) -> anyhow::Result<Vec<TimeSlot>> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time, max_capacity, is_active FROM time_slots
         WHERE is_active = 1 OR ?1 = 0 ORDER BY start_time ASC",
    )?;
    let rows = stmt.query_map(params![active_only], |row| Ok(parse_time_slot_row(row)))?;
    collect_rows(rows)
}

fn parse_time_slot_row(row: &rusqlite::Row) -> anyhow::Result<TimeSlot> {
    let start_time: String = row.get(1)?;
    Ok(TimeSlot {
        id: row.get(0)?,
        start_time: parse_time(&start_time)?,
        max_capacity: row.get(2)?,
        is_active: row.get(3)?,
    })
}

pub fn insert_placement(conn: &Connection, placement: &NewPlacement) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO placements (name, location, daily_rate) VALUES (?1, ?2, ?3)",
        params![placement.name, placement.location, placement.daily_rate],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_placement(conn: &Connection, id: i64) -> anyhow::Result<Option<Placement>> {
    let result = conn.query_row(
        "SELECT id, name, location, daily_rate, is_active FROM placements WHERE id = ?1",
        params![id],
        |row| Ok(Ok(parse_placement_row(row)?)),
    );
    optional_row(result)
}

pub fn list_placements(conn: &Connection, active_only: bool) -> anyhow::Result<Vec<Placement>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, location, daily_rate, is_active FROM placements
         WHERE is_active = 1 OR ?1 = 0 ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![active_only], |row| Ok(Ok(parse_placement_row(row)?)))?;
    collect_rows(rows)
}

fn parse_placement_row(row: &rusqlite::Row) -> rusqlite::Result<Placement> {
    Ok(Placement {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        daily_rate: row.get(3)?,
        is_active: row.get(4)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, date, start_time, end_date, end_time, status, ref_number, customer_id, vehicle_id, \
     service_id, service_package_id, technician_id, time_slot_id, customer_notes, technician_notes, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (date, start_time, end_date, end_time, status, ref_number, customer_id, vehicle_id,
             service_id, service_package_id, technician_id, time_slot_id, customer_notes, technician_notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            fmt_date(&booking.date),
            booking.start_time.format(hhmm::FORMAT).to_string(),
            fmt_date(&booking.end_date),
            booking.end_time.format(hhmm::FORMAT).to_string(),
            booking.status.as_str(),
            booking.ref_number,
            booking.customer_id,
            booking.vehicle_id,
            booking.service_id,
            booking.service_package_id,
            booking.technician_id,
            booking.time_slot_id,
            booking.customer_notes,
            booking.technician_notes,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Writes every mutable field of an existing booking.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET date = ?1, start_time = ?2, end_date = ?3, end_time = ?4, status = ?5,
             technician_id = ?6, time_slot_id = ?7, customer_notes = ?8, technician_notes = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            fmt_date(&booking.date),
            booking.start_time.format(hhmm::FORMAT).to_string(),
            fmt_date(&booking.end_date),
            booking.end_time.format(hhmm::FORMAT).to_string(),
            booking.status.as_str(),
            booking.technician_id,
            booking.time_slot_id,
            booking.customer_notes,
            booking.technician_notes,
            fmt_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(now), id],
    )?;
    Ok(count > 0)
}

/// Moves a booking from `from` to `to`; returns false if it was not in `from`.
pub fn transition_booking_status(
    conn: &Connection,
    id: i64,
    from: BookingStatus,
    to: BookingStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![to.as_str(), fmt_ts(now), id, from.as_str()],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );
    optional_row(result)
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub customer_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut clauses: Vec<String> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(customer_id) = filter.customer_id {
        values.push(Box::new(customer_id));
        clauses.push(format!("customer_id = ?{}", values.len()));
    }
    if let Some(technician_id) = filter.technician_id {
        values.push(Box::new(technician_id));
        clauses.push(format!("technician_id = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(date) = filter.date {
        values.push(Box::new(fmt_date(&date)));
        clauses.push(format!("date = ?{}", values.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings{where_sql} ORDER BY date DESC, start_time DESC, id DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;
    collect_rows(rows)
}

/// Bookings holding a seat in `(date, time_slot_id)`. Only rejected bookings release it.
pub fn count_slot_bookings(
    conn: &Connection,
    date: &NaiveDate,
    time_slot_id: i64,
    exclude_booking: Option<i64>,
) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE date = ?1 AND time_slot_id = ?2 AND status != 'rejected' AND id != ?3",
        params![fmt_date(date), time_slot_id, exclude_booking.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date: String = row.get(1)?;
    let start_time: String = row.get(2)?;
    let end_date: String = row.get(3)?;
    let end_time: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(15)?;
    let updated_at: String = row.get(16)?;

    Ok(Booking {
        id: row.get(0)?,
        date: parse_date(&date)?,
        start_time: parse_time(&start_time)?,
        end_date: parse_date(&end_date)?,
        end_time: parse_time(&end_time)?,
        status: BookingStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown booking status: {status}"))?,
        ref_number: row.get(6)?,
        customer_id: row.get(7)?,
        vehicle_id: row.get(8)?,
        service_id: row.get(9)?,
        service_package_id: row.get(10)?,
        technician_id: row.get(11)?,
        time_slot_id: row.get(12)?,
        customer_notes: row.get(13)?,
        technician_notes: row.get(14)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Invoices ──

const INVOICE_COLUMNS: &str = "id, number, amount, status, booking_id, advertisement_id, created_at";

pub fn insert_invoice(
    conn: &Connection,
    owner: InvoiceOwner,
    amount: f64,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let (booking_id, advertisement_id) = match owner {
        InvoiceOwner::Booking(id) => (Some(id), None),
        InvoiceOwner::Advertisement(id) => (None, Some(id)),
    };
    conn.execute(
        "INSERT INTO invoices (number, amount, status, booking_id, advertisement_id, created_at)
         VALUES ('', ?1, 'pending', ?2, ?3, ?4)",
        params![amount, booking_id, advertisement_id, fmt_ts(now)],
    )?;
    let id = conn.last_insert_rowid();

    let number = format!("INV-{}-{id:05}", now.format("%Y%m%d"));
    conn.execute("UPDATE invoices SET number = ?1 WHERE id = ?2", params![number, id])?;
    Ok(id)
}

pub fn get_invoice(conn: &Connection, id: i64) -> anyhow::Result<Option<Invoice>> {
    let result = conn.query_row(
        &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"),
        params![id],
        |row| Ok(parse_invoice_row(row)),
    );
    optional_row(result)
}

/// Latest invoice billed against an owner.
pub fn get_invoice_for(conn: &Connection, owner: InvoiceOwner) -> anyhow::Result<Option<Invoice>> {
    let (column, id) = match owner {
        InvoiceOwner::Booking(id) => ("booking_id", id),
        InvoiceOwner::Advertisement(id) => ("advertisement_id", id),
    };
    let result = conn.query_row(
        &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE {column} = ?1 ORDER BY id DESC LIMIT 1"),
        params![id],
        |row| Ok(parse_invoice_row(row)),
    );
    optional_row(result)
}

pub fn get_paid_invoice_for_booking(conn: &Connection, booking_id: i64) -> anyhow::Result<Option<Invoice>> {
    let result = conn.query_row(
        &format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE booking_id = ?1 AND status = 'paid' ORDER BY id DESC LIMIT 1"
        ),
        params![booking_id],
        |row| Ok(parse_invoice_row(row)),
    );
    optional_row(result)
}

/// Flips a pending invoice to paid. Returns false if it was already paid.
pub fn mark_invoice_paid(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE invoices SET status = 'paid' WHERE id = ?1 AND status = 'pending'",
        params![id],
    )?;
    Ok(count > 0)
}

fn parse_invoice_row(row: &rusqlite::Row) -> anyhow::Result<Invoice> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(6)?;
    Ok(Invoice {
        id: row.get(0)?,
        number: row.get(1)?,
        amount: row.get(2)?,
        status: InvoiceStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown invoice status: {status}"))?,
        booking_id: row.get(4)?,
        advertisement_id: row.get(5)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Payments ──

const PAYMENT_COLUMNS: &str =
    "id, amount, method, status, invoice_id, reference, slip_url, card_brand, card_last4, created_at";

pub fn insert_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO payments (amount, method, status, invoice_id, reference, slip_url, card_brand, card_last4, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            payment.amount,
            payment.method.as_str(),
            payment.status,
            payment.invoice_id,
            payment.reference,
            payment.slip_url,
            payment.card_brand,
            payment.card_last4,
            fmt_ts(&payment.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_payments_for_invoice(conn: &Connection, invoice_id: i64) -> anyhow::Result<Vec<Payment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = ?1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map(params![invoice_id], |row| Ok(parse_payment_row(row)))?;
    collect_rows(rows)
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<Payment> {
    let method: String = row.get(2)?;
    let created_at: String = row.get(9)?;
    Ok(Payment {
        id: row.get(0)?,
        amount: row.get(1)?,
        method: PaymentMethod::parse(&method)
            .ok_or_else(|| anyhow::anyhow!("unknown payment method: {method}"))?,
        status: row.get(3)?,
        invoice_id: row.get(4)?,
        reference: row.get(5)?,
        slip_url: row.get(6)?,
        card_brand: row.get(7)?,
        card_last4: row.get(8)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Refunds ──

const REFUND_COLUMNS: &str = "id, amount, reason, status, invoice_id, created_at, updated_at";

pub fn insert_refund(
    conn: &Connection,
    invoice_id: i64,
    amount: f64,
    reason: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let ts = fmt_ts(now);
    conn.execute(
        "INSERT INTO refunds (amount, reason, status, invoice_id, created_at, updated_at)
         VALUES (?1, ?2, 'pending', ?3, ?4, ?4)",
        params![amount, reason, invoice_id, ts],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_refund(conn: &Connection, id: i64) -> anyhow::Result<Option<Refund>> {
    let result = conn.query_row(
        &format!("SELECT {REFUND_COLUMNS} FROM refunds WHERE id = ?1"),
        params![id],
        |row| Ok(parse_refund_row(row)),
    );
    optional_row(result)
}

pub fn list_refunds(conn: &Connection, status: Option<RefundStatus>) -> anyhow::Result<Vec<Refund>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REFUND_COLUMNS} FROM refunds WHERE ?1 IS NULL OR status = ?1 ORDER BY id DESC"
    ))?;
    let rows = stmt.query_map(params![status.map(|s| s.as_str())], |row| {
        Ok(parse_refund_row(row))
    })?;
    collect_rows(rows)
}

pub fn list_refunds_for_invoice(conn: &Connection, invoice_id: i64) -> anyhow::Result<Vec<Refund>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REFUND_COLUMNS} FROM refunds WHERE invoice_id = ?1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map(params![invoice_id], |row| Ok(parse_refund_row(row)))?;
    collect_rows(rows)
}

pub fn update_refund_status(
    conn: &Connection,
    id: i64,
    status: RefundStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE refunds SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(now), id],
    )?;
    Ok(count > 0)
}

fn parse_refund_row(row: &rusqlite::Row) -> anyhow::Result<Refund> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(Refund {
        id: row.get(0)?,
        amount: row.get(1)?,
        reason: row.get(2)?,
        status: RefundStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown refund status: {status}"))?,
        invoice_id: row.get(4)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Tracking & History ──

pub fn insert_tracking(
    conn: &Connection,
    booking_id: i64,
    status: TrackingStatus,
    note: Option<&str>,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO service_tracking (status, booking_id, note, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![status.as_str(), booking_id, note, fmt_ts(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_tracking(conn: &Connection, id: i64) -> anyhow::Result<Option<ServiceTracking>> {
    let result = conn.query_row(
        "SELECT id, status, booking_id, note, created_at FROM service_tracking WHERE id = ?1",
        params![id],
        |row| Ok(parse_tracking_row(row)),
    );
    optional_row(result)
}

pub fn list_tracking(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<ServiceTracking>> {
    let mut stmt = conn.prepare(
        "SELECT id, status, booking_id, note, created_at FROM service_tracking
         WHERE booking_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| Ok(parse_tracking_row(row)))?;
    collect_rows(rows)
}

fn parse_tracking_row(row: &rusqlite::Row) -> anyhow::Result<ServiceTracking> {
    let status: String = row.get(1)?;
    let created_at: String = row.get(4)?;
    Ok(ServiceTracking {
        id: row.get(0)?,
        status: TrackingStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown tracking status: {status}"))?,
        booking_id: row.get(2)?,
        note: row.get(3)?,
        created_at: parse_ts(&created_at)?,
    })
}

pub fn insert_history(
    conn: &Connection,
    booking_id: i64,
    user_id: i64,
    action: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_history (action, booking_id, user_id, timestamp) VALUES (?1, ?2, ?3, ?4)",
        params![action, booking_id, user_id, fmt_ts(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_history(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<BookingHistory>> {
    let mut stmt = conn.prepare(
        "SELECT id, action, booking_id, user_id, timestamp FROM booking_history
         WHERE booking_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| Ok(parse_history_row(row)))?;
    collect_rows(rows)
}

fn parse_history_row(row: &rusqlite::Row) -> anyhow::Result<BookingHistory> {
    let timestamp: String = row.get(4)?;
    Ok(BookingHistory {
        id: row.get(0)?,
        action: row.get(1)?,
        booking_id: row.get(2)?,
        user_id: row.get(3)?,
        timestamp: parse_ts(&timestamp)?,
    })
}

// ── Advertisements ──

const AD_COLUMNS: &str = "id, title, content, image_url, advertiser_id, placement_id, start_date, end_date, \
     status, impressions, clicks, created_at";

pub fn insert_advertisement(conn: &Connection, ad: &Advertisement) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO advertisements (title, content, image_url, advertiser_id, placement_id, start_date, end_date,
             status, impressions, clicks, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            ad.title,
            ad.content,
            ad.image_url,
            ad.advertiser_id,
            ad.placement_id,
            fmt_date(&ad.start_date),
            fmt_date(&ad.end_date),
            ad.status.as_str(),
            ad.impressions,
            ad.clicks,
            fmt_ts(&ad.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_advertisement(conn: &Connection, id: i64) -> anyhow::Result<Option<Advertisement>> {
    let result = conn.query_row(
        &format!("SELECT {AD_COLUMNS} FROM advertisements WHERE id = ?1"),
        params![id],
        |row| Ok(parse_ad_row(row)),
    );
    optional_row(result)
}

pub fn list_advertisements(
    conn: &Connection,
    advertiser_id: Option<i64>,
    status: Option<AdStatus>,
) -> anyhow::Result<Vec<Advertisement>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AD_COLUMNS} FROM advertisements
         WHERE (?1 IS NULL OR advertiser_id = ?1) AND (?2 IS NULL OR status = ?2)
         ORDER BY id DESC"
    ))?;
    let rows = stmt.query_map(params![advertiser_id, status.map(|s| s.as_str())], |row| {
        Ok(parse_ad_row(row))
    })?;
    collect_rows(rows)
}

pub fn transition_ad_status(
    conn: &Connection,
    id: i64,
    from: AdStatus,
    to: AdStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE advertisements SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![to.as_str(), id, from.as_str()],
    )?;
    Ok(count > 0)
}

/// Bumps the impression or click counter of an active ad.
pub fn increment_ad_counter(conn: &Connection, id: i64, clicks: bool) -> anyhow::Result<bool> {
    let sql = if clicks {
        "UPDATE advertisements SET clicks = clicks + 1 WHERE id = ?1 AND status = 'active'"
    } else {
        "UPDATE advertisements SET impressions = impressions + 1 WHERE id = ?1 AND status = 'active'"
    };
    let count = conn.execute(sql, params![id])?;
    Ok(count > 0)
}

fn parse_ad_row(row: &rusqlite::Row) -> anyhow::Result<Advertisement> {
    let start_date: String = row.get(6)?;
    let end_date: String = row.get(7)?;
    let status: String = row.get(8)?;
    let created_at: String = row.get(11)?;
    Ok(Advertisement {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        advertiser_id: row.get(4)?,
        placement_id: row.get(5)?,
        start_date: parse_date(&start_date)?,
        end_date: parse_date(&end_date)?,
        status: AdStatus::parse(&status).ok_or_else(|| anyhow::anyhow!("unknown ad status: {status}"))?,
        impressions: row.get(9)?,
        clicks: row.get(10)?,
        created_at: parse_ts(&created_at)?,
    })
}

// ── Report Snapshots ──

pub fn insert_report(
    conn: &Connection,
    report_type: ReportType,
    parameters: &serde_json::Value,
    data: &serde_json::Value,
    generated_by: i64,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO reports (report_type, parameters, data, generated_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            report_type.as_str(),
            serde_json::to_string(parameters)?,
            serde_json::to_string(data)?,
            generated_by,
            fmt_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_report(conn: &Connection, id: i64) -> anyhow::Result<Option<Report>> {
    let result = conn.query_row(
        "SELECT id, report_type, parameters, data, generated_by, created_at FROM reports WHERE id = ?1",
        params![id],
        |row| Ok(parse_report_row(row)),
    );
    optional_row(result)
}

pub fn list_reports(
    conn: &Connection,
    report_type: Option<ReportType>,
    limit: i64,
) -> anyhow::Result<Vec<Report>> {
    let mut stmt = conn.prepare(
        "SELECT id, report_type, parameters, data, generated_by, created_at FROM reports
         WHERE ?1 IS NULL OR report_type = ?1 ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![report_type.map(|t| t.as_str()), limit], |row| {
        Ok(parse_report_row(row))
    })?;
    collect_rows(rows)
}

fn parse_report_row(row: &rusqlite::Row) -> anyhow::Result<Report> {
    let report_type: String = row.get(1)?;
    let parameters: String = row.get(2)?;
    let data: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    Ok(Report {
        id: row.get(0)?,
        report_type: ReportType::parse(&report_type)
            .ok_or_else(|| anyhow::anyhow!("unknown report type: {report_type}"))?,
        parameters: serde_json::from_str(&parameters)?,
        data: serde_json::from_str(&data)?,
        generated_by: row.get(4)?,
        created_at: parse_ts(&created_at)?,
    })
}
