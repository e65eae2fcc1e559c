use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::blank;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub number: String,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub booking_id: Option<i64>,
    pub advertisement_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl Invoice {
    pub fn owner(&self) -> Option<InvoiceOwner> {
        match (self.booking_id, self.advertisement_id) {
            (Some(id), None) => Some(InvoiceOwner::Booking(id)),
            (None, Some(id)) => Some(InvoiceOwner::Advertisement(id)),
            _ => None,
        }
    }
}

/// What an invoice bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceOwner {
    Booking(i64),
    Advertisement(i64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: String,
    pub invoice_id: i64,
    pub reference: Option<String>,
    pub slip_url: Option<String>,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Online => "online",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "online" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayment {
    #[serde(default, deserialize_with = "blank::opt")]
    pub invoice_id: Option<i64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub slip_url: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub card_brand: Option<String>,
    #[serde(default, deserialize_with = "blank::opt")]
    pub card_last4: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: i64,
    #[serde(rename = "refundAmount")]
    pub amount: f64,
    pub reason: String,
    #[serde(rename = "refundStatus")]
    pub status: RefundStatus,
    pub invoice_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Approved,
    Processed,
    Rejected,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Approved => "approved",
            RefundStatus::Processed => "processed",
            RefundStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RefundStatus::Pending),
            "approved" => Some(RefundStatus::Approved),
            "processed" => Some(RefundStatus::Processed),
            "rejected" => Some(RefundStatus::Rejected),
            _ => None,
        }
    }

    pub fn can_become(&self, next: RefundStatus) -> bool {
        matches!(
            (self, next),
            (RefundStatus::Pending, RefundStatus::Approved)
                | (RefundStatus::Pending, RefundStatus::Rejected)
                | (RefundStatus::Approved, RefundStatus::Processed)
        )
    }
}

/// Rounds to whole cents.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
