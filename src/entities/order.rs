//! Order entity and lifecycle status
//!
//! An order is a persisted cart snapshot owned by a user. Its status starts
//! at `NEW` (the user's current cart) and moves to `PAYED` when a completed
//! payment is recorded against it. Admins may force any other status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an order.
///
/// The string forms (`NEW`, `PAYED`, ...) are the wire and storage
/// representation; `all()` backs the status catalog endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Payed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All known statuses, in lifecycle order.
    pub const fn all() -> [OrderStatus; 5] {
        [
            OrderStatus::New,
            OrderStatus::Payed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Payed => "PAYED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse a status from its wire form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        OrderStatus::all().into_iter().find(|st| st.as_str() == s)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order: a product variant and how many of it.
///
/// `price` is the unit price the client claims for the variant; order
/// creation verifies it against the catalog before anything is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Uuid,
    pub size: String,
    pub price: f64,
    pub quantity: u32,
}

/// A persisted cart snapshot owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Owning user.
    pub user: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Supplied by the caller at creation time; not recomputed server-side.
    pub total_price: f64,
    /// External payment-processor identifier, set once the order is paid.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order in `NEW` status for the given user.
    pub fn new(user: Uuid, items: Vec<OrderItem>, total_price: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user,
            items,
            status: OrderStatus::New,
            total_price,
            payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a completed payment: attach the processor id and move to `PAYED`.
    pub fn mark_paid(&mut self, payment_id: &str) {
        self.payment_id = Some(payment_id.to_string());
        self.status = OrderStatus::Payed;
        self.touch();
    }

    /// Refresh the `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
