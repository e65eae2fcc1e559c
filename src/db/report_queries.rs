use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::db::queries::fmt_date;
use crate::models::invoice::round_currency;
use crate::models::report::{
    percentage, AdPerformance, DailyBookings, RevenueAnalysis, ServiceRevenue, SlotUtilization,
    TechnicianPerformance,
};

// ── Daily Bookings ──

pub fn daily_bookings(conn: &Connection, date: &NaiveDate) -> anyhow::Result<DailyBookings> {
    let day = fmt_date(date);

    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM bookings WHERE date = ?1 GROUP BY status ORDER BY status",
    )?;
    let rows = stmt.query_map(params![day], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut by_status = BTreeMap::new();
    for row in rows {
        let (status, count) = row?;
        by_status.insert(status, count);
    }
    let total_bookings = by_status.values().sum();

    let mut stmt = conn.prepare(
        "SELECT ts.id, ts.start_time, ts.max_capacity,
                (SELECT COUNT(*) FROM bookings b
                 WHERE b.time_slot_id = ts.id AND b.date = ?1 AND b.status != 'rejected')
         FROM time_slots ts
         WHERE ts.is_active = 1
            OR EXISTS (SELECT 1 FROM bookings b WHERE b.time_slot_id = ts.id AND b.date = ?1)
         ORDER BY ts.start_time ASC",
    )?;
    let rows = stmt.query_map(params![day], |row| {
        let max_capacity: i64 = row.get(2)?;
        let booked: i64 = row.get(3)?;
        Ok(SlotUtilization {
            time_slot_id: row.get(0)?,
            start_time: row.get(1)?,
            max_capacity,
            booked,
            utilization: percentage(booked, max_capacity),
        })
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }

    Ok(DailyBookings {
        date: *date,
        total_bookings,
        by_status,
        slots,
    })
}

// ── Revenue ──

pub fn revenue_analysis(
    conn: &Connection,
    from: &NaiveDate,
    to: &NaiveDate,
) -> anyhow::Result<RevenueAnalysis> {
    let (from_s, to_s) = (fmt_date(from), fmt_date(to));

    let (total_collected, payment_count): (f64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM payments
         WHERE status = 'completed' AND date(created_at) BETWEEN ?1 AND ?2",
        params![from_s, to_s],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT method, SUM(amount) FROM payments
         WHERE status = 'completed' AND date(created_at) BETWEEN ?1 AND ?2
         GROUP BY method ORDER BY method",
    )?;
    let rows = stmt.query_map(params![from_s, to_s], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut by_method = BTreeMap::new();
    for row in rows {
        let (method, amount) = row?;
        by_method.insert(method, round_currency(amount));
    }

    let (booking_revenue, advertising_revenue): (f64, f64) = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN i.booking_id IS NOT NULL THEN p.amount END), 0),
            COALESCE(SUM(CASE WHEN i.advertisement_id IS NOT NULL THEN p.amount END), 0)
         FROM payments p JOIN invoices i ON i.id = p.invoice_id
         WHERE p.status = 'completed' AND date(p.created_at) BETWEEN ?1 AND ?2",
        params![from_s, to_s],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let refunds_issued: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM refunds
         WHERE status != 'rejected' AND date(created_at) BETWEEN ?1 AND ?2",
        params![from_s, to_s],
        |row| row.get(0),
    )?;

    let outstanding_invoices: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM invoices
         WHERE status = 'pending' AND date(created_at) BETWEEN ?1 AND ?2",
        params![from_s, to_s],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT COALESCE(s.name, sp.name, 'Unknown'), COUNT(DISTINCT b.id), COALESCE(SUM(p.amount), 0)
         FROM payments p
         JOIN invoices i ON i.id = p.invoice_id
         JOIN bookings b ON b.id = i.booking_id
         LEFT JOIN services s ON s.id = b.service_id
         LEFT JOIN service_packages sp ON sp.id = b.service_package_id
         WHERE p.status = 'completed' AND date(p.created_at) BETWEEN ?1 AND ?2
         GROUP BY b.service_id, b.service_package_id
         ORDER BY 3 DESC",
    )?;
    let rows = stmt.query_map(params![from_s, to_s], |row| {
        Ok(ServiceRevenue {
            name: row.get(0)?,
            bookings: row.get(1)?,
            revenue: round_currency(row.get(2)?),
        })
    })?;
    let mut by_service = vec![];
    for row in rows {
        by_service.push(row?);
    }

    Ok(RevenueAnalysis {
        from: *from,
        to: *to,
        total_collected: round_currency(total_collected),
        payment_count,
        by_method,
        booking_revenue: round_currency(booking_revenue),
        advertising_revenue: round_currency(advertising_revenue),
        refunds_issued: round_currency(refunds_issued),
        net_revenue: round_currency(total_collected - refunds_issued),
        outstanding_invoices: round_currency(outstanding_invoices),
        by_service,
    })
}

// ── Technicians ──

pub fn technician_performance(
    conn: &Connection,
    from: &NaiveDate,
    to: &NaiveDate,
) -> anyhow::Result<Vec<TechnicianPerformance>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name,
                COUNT(b.id),
                COALESCE(SUM(CASE WHEN b.status = 'completed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN b.status = 'in_progress' THEN 1 ELSE 0 END), 0)
         FROM technicians t
         LEFT JOIN bookings b
           ON b.technician_id = t.id AND b.date BETWEEN ?1 AND ?2 AND b.status NOT IN ('cancelled', 'rejected')
         GROUP BY t.id, t.name
         ORDER BY t.name ASC",
    )?;
    let rows = stmt.query_map(params![fmt_date(from), fmt_date(to)], |row| {
        let assigned: i64 = row.get(2)?;
        let completed: i64 = row.get(3)?;
        Ok(TechnicianPerformance {
            technician_id: row.get(0)?,
            name: row.get(1)?,
            assigned,
            completed,
            in_progress: row.get(4)?,
            completion_rate: percentage(completed, assigned),
        })
    })?;

    let mut performance = vec![];
    for row in rows {
        performance.push(row?);
    }
    Ok(performance)
}

// ── Advertisements ──

pub fn ad_performance(conn: &Connection) -> anyhow::Result<Vec<AdPerformance>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.title, a.status, a.impressions, a.clicks,
                COALESCE((SELECT SUM(p.amount) FROM payments p
                          JOIN invoices i ON i.id = p.invoice_id
                          WHERE i.advertisement_id = a.id AND p.status = 'completed'), 0)
         FROM advertisements a
         ORDER BY a.id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let impressions: i64 = row.get(3)?;
        let clicks: i64 = row.get(4)?;
        Ok(AdPerformance {
            advertisement_id: row.get(0)?,
            title: row.get(1)?,
            status: row.get(2)?,
            impressions,
            clicks,
            ctr: percentage(clicks, impressions),
            spend: round_currency(row.get(5)?),
        })
    })?;

    let mut performance = vec![];
    for row in rows {
        performance.push(row?);
    }
    Ok(performance)
}
