use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Claims, Refund, RefundStatus};

pub const REJECTION_REASON: &str = "Booking rejected by workshop";

/// Share of the paid amount returned when a booking is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundTier {
    Full,
    Half,
    None,
}

impl RefundTier {
    /// Tier for cancelling an appointment starting at `starts_at`, decided at `now`.
    pub fn for_notice(starts_at: &NaiveDateTime, now: &NaiveDateTime) -> Self {
        let notice = *starts_at - *now;
        if notice >= Duration::hours(24) {
            RefundTier::Full
        } else if notice > Duration::zero() {
            RefundTier::Half
        } else {
            RefundTier::None
        }
    }

    pub fn percent(&self) -> u32 {
        match self {
            RefundTier::Full => 100,
            RefundTier::Half => 50,
            RefundTier::None => 0,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            RefundTier::Full => "Cancellation (> 24h notice)",
            RefundTier::Half => "Late cancellation (< 24h notice)",
            RefundTier::None => "Cancellation after scheduled time",
        }
    }

    pub fn display(&self) -> String {
        format!("{}%", self.percent())
    }

    pub fn amount_of(&self, paid: f64) -> f64 {
        crate::models::invoice::round_currency(paid * f64::from(self.percent()) / 100.0)
    }
}

pub fn list_refunds(
    conn: &Connection,
    actor: &Claims,
    status: Option<&str>,
) -> Result<Vec<Refund>, AppError> {
    require_staff(actor)?;
    let status = status
        .map(|s| RefundStatus::parse(s).ok_or_else(|| AppError::validation(format!("Invalid refund status: {s}"))))
        .transpose()?;
    Ok(queries::list_refunds(conn, status)?)
}

/// Advances a refund: pending -> approved | rejected, approved -> processed.
pub fn update_refund_status(
    conn: &mut Connection,
    actor: &Claims,
    id: i64,
    status: &str,
    now: NaiveDateTime,
) -> Result<Refund, AppError> {
    require_staff(actor)?;
    let next = RefundStatus::parse(status)
        .ok_or_else(|| AppError::validation(format!("Invalid refund status: {status}")))?;

    let tx = conn.transaction()?;
    let refund = queries::get_refund(&tx, id)?.ok_or_else(|| AppError::not_found("Refund not found"))?;
    if !refund.status.can_become(next) {
        return Err(AppError::validation(format!(
            "Refund cannot move from {} to {}",
            refund.status.as_str(),
            next.as_str()
        )));
    }

    queries::update_refund_status(&tx, id, next, &now)?;
    let updated = queries::get_refund(&tx, id)?.ok_or_else(|| AppError::not_found("Refund not found"))?;
    tx.commit()?;

    tracing::info!(refund = id, status = next.as_str(), user = actor.user_id, "refund status updated");
    Ok(updated)
}

fn require_staff(actor: &Claims) -> Result<(), AppError> {
    if !actor.is_staff() {
        return Err(AppError::forbidden("Only managers can administer refunds"));
    }
    Ok(())
}
