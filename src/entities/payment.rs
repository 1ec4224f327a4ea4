//! Payment entity
//!
//! A payment records one attempt to settle an order's total. One is created
//! for every pay call regardless of outcome, so the collection doubles as an
//! attempt log; payments are never deleted, not even when their order is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a payment attempt as reported by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
        }
    }

    /// Parse a status from its wire form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted record of one attempt to settle an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    /// Order this payment settles (non-owning reference).
    pub order: Uuid,
    /// User who paid.
    pub user: Uuid,
    /// External payment-processor identifier.
    pub payment_id: String,
    pub method: String,
    /// Copied from the order's `total_price` at creation.
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        order: Uuid,
        user: Uuid,
        payment_id: String,
        method: String,
        amount: f64,
        status: PaymentStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            user,
            payment_id,
            method,
            amount,
            status,
            created_at: Utc::now(),
        }
    }
}
