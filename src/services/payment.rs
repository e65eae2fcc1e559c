use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::invoice::RecordPayment;
use crate::models::{
    AdStatus, BookingStatus, Claims, Invoice, InvoiceOwner, InvoiceStatus, Payment, PaymentMethod,
    Refund, Role, TrackingStatus,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
    pub refunds: Vec<Refund>,
}

/// Records a payment and moves the billed booking or advertisement to its next stage.
pub fn record_payment(
    conn: &mut Connection,
    actor: &Claims,
    req: RecordPayment,
    now: NaiveDateTime,
) -> Result<Payment, AppError> {
    let (Some(invoice_id), Some(amount), Some(method)) = (req.invoice_id, req.amount, req.method.as_deref())
    else {
        return Err(AppError::validation(
            "Missing required fields: invoiceId, amount, method",
        ));
    };
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("Amount must be a positive number"));
    }
    let method = PaymentMethod::parse(method.trim())
        .ok_or_else(|| AppError::validation(format!("Invalid payment method: {method}")))?;
    if method == PaymentMethod::Card {
        let valid = req
            .card_last4
            .as_deref()
            .is_some_and(|d| d.len() == 4 && d.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            return Err(AppError::validation(
                "Card payments require the last four card digits",
            ));
        }
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let invoice = queries::get_invoice(&tx, invoice_id)?.ok_or_else(|| AppError::not_found("Invoice not found"))?;
    let owner = invoice
        .owner()
        .ok_or_else(|| anyhow::anyhow!("invoice {} has no owner", invoice.id))?;
    ensure_can_pay(&tx, actor, owner)?;

    if invoice.status == InvoiceStatus::Paid {
        return Err(AppError::validation("Invoice is already paid"));
    }
    ensure_payable(&tx, owner)?;
    if amount < invoice.amount {
        return Err(AppError::validation(format!(
            "Payment of {amount:.2} does not cover the invoice amount of {:.2}",
            invoice.amount
        )));
    }

    let mut payment = Payment {
        id: 0,
        amount,
        method,
        status: "completed".to_string(),
        invoice_id,
        reference: req.reference,
        slip_url: req.slip_url,
        card_brand: req.card_brand,
        card_last4: req.card_last4,
        created_at: now,
    };
    payment.id = queries::insert_payment(&tx, &payment)?;

    if !queries::mark_invoice_paid(&tx, invoice.id)? {
        return Err(AppError::validation("Invoice is already paid"));
    }

    match owner {
        InvoiceOwner::Booking(booking_id) => {
            queries::transition_booking_status(
                &tx,
                booking_id,
                BookingStatus::Pending,
                BookingStatus::Accepted,
                &now,
            )?;
            queries::insert_tracking(&tx, booking_id, TrackingStatus::PaymentReceived, None, &now)?;
            queries::insert_history(&tx, booking_id, actor.user_id, "payment received", &now)?;
        }
        InvoiceOwner::Advertisement(ad_id) => {
            queries::transition_ad_status(&tx, ad_id, AdStatus::Pending, AdStatus::Active)?;
        }
    }

    tx.commit()?;

    tracing::info!(
        payment = payment.id,
        invoice = invoice.id,
        amount,
        method = method.as_str(),
        "payment recorded"
    );
    Ok(payment)
}

pub fn invoice_details(
    conn: &Connection,
    actor: &Claims,
    owner: InvoiceOwner,
) -> Result<InvoiceDetails, AppError> {
    ensure_can_pay(conn, actor, owner)?;
    let invoice = queries::get_invoice_for(conn, owner)?.ok_or_else(|| AppError::not_found("Invoice not found"))?;
    let payments = queries::list_payments_for_invoice(conn, invoice.id)?;
    let refunds = queries::list_refunds_for_invoice(conn, invoice.id)?;
    Ok(InvoiceDetails {
        invoice,
        payments,
        refunds,
    })
}

/// A cancelled or rejected booking and an ad past `pending` have nothing left to pay for.
/// Completed bookings can still be settled at pickup.
fn ensure_payable(conn: &Connection, owner: InvoiceOwner) -> Result<(), AppError> {
    match owner {
        InvoiceOwner::Booking(id) => {
            let booking = queries::get_booking_by_id(conn, id)?
                .ok_or_else(|| AppError::not_found("Booking not found"))?;
            if matches!(booking.status, BookingStatus::Cancelled | BookingStatus::Rejected) {
                return Err(AppError::validation(format!(
                    "Booking is {} and can no longer be paid",
                    booking.status.as_str()
                )));
            }
        }
        InvoiceOwner::Advertisement(id) => {
            let ad = queries::get_advertisement(conn, id)?
                .ok_or_else(|| AppError::not_found("Advertisement not found"))?;
            if ad.status != AdStatus::Pending {
                return Err(AppError::validation(format!(
                    "Advertisement is {} and can no longer be paid",
                    ad.status.as_str()
                )));
            }
        }
    }
    Ok(())
}

/// Customers pay for their own bookings, advertisers for their own ads, staff for anything.
fn ensure_can_pay(conn: &Connection, actor: &Claims, owner: InvoiceOwner) -> Result<(), AppError> {
    if actor.is_staff() {
        return Ok(());
    }
    let allowed = match (actor.role, owner) {
        (Role::Customer, InvoiceOwner::Booking(id)) => {
            let booking = queries::get_booking_by_id(conn, id)?
                .ok_or_else(|| AppError::not_found("Booking not found"))?;
            actor.customer_id == Some(booking.customer_id)
        }
        (Role::Advertiser, InvoiceOwner::Advertisement(id)) => {
            let ad = queries::get_advertisement(conn, id)?
                .ok_or_else(|| AppError::not_found("Advertisement not found"))?;
            actor.advertiser_id == Some(ad.advertiser_id)
        }
        _ => false,
    };
    if !allowed {
        return Err(AppError::forbidden("You do not have access to this invoice"));
    }
    Ok(())
}
