//! Storage traits for the order/payment stores and their read-only
//! collaborators (product catalog, user directory).
//!
//! Backends return `anyhow::Result`; the service layer converts failures
//! into [`crate::core::ApiError`]. Two implementations exist: an in-memory
//! backend for tests and development, and the MongoDB backend.

pub mod in_memory;
pub mod mongodb;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{Order, OrderStatus, Payment, Product, User};

pub use in_memory::{
    InMemoryOrderStore, InMemoryPaymentStore, InMemoryProductCatalog, InMemoryUserDirectory,
};
pub use self::mongodb::{
    MongoOrderStore, MongoPaymentStore, MongoProductCatalog, MongoUserDirectory,
};

/// Filter for order queries. Empty filter matches everything.
///
/// Creation-time bounds are inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn for_user(user: Uuid) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether an order satisfies this filter (in-memory evaluation).
    pub fn matches(&self, order: &Order) -> bool {
        if self.user.is_some_and(|user| order.user != user) {
            return false;
        }
        if self.status.is_some_and(|status| order.status != status) {
            return false;
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        true
    }
}

/// Persistence seam for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<Order>;

    async fn get(&self, id: &Uuid) -> Result<Option<Order>>;

    /// Replace the stored order. Errors if the order does not exist.
    async fn update(&self, order: &Order) -> Result<()>;

    /// Delete by id. Returns whether an order was removed.
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    /// Filtered find, sorted by creation time descending.
    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// The user's most recently created `NEW` order, if any.
    async fn latest_open_for_user(&self, user: &Uuid) -> Result<Option<Order>>;

    async fn count(&self, filter: &OrderFilter) -> Result<u64>;
}

/// Persistence seam for payment attempts. Payments are never deleted.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<Payment>;

    async fn get(&self, id: &Uuid) -> Result<Option<Payment>>;

    /// Replace the stored payment. Errors if the payment does not exist.
    async fn update(&self, payment: &Payment) -> Result<()>;
}

/// Read-only view of the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get(&self, id: &Uuid) -> Result<Option<Product>>;
}

/// Read-only view of the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: &Uuid) -> Result<Option<User>>;
}
