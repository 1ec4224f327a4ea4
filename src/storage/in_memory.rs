//! In-memory implementations of the storage traits for testing and
//! development. Thread-safe via `RwLock`; clones data out on reads.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::entities::{Order, OrderStatus, Payment, Product, User};
use crate::storage::{OrderFilter, OrderStore, PaymentStore, ProductCatalog, UserDirectory};

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored order, unsorted. Test helper.
    pub fn all(&self) -> Vec<Order> {
        self.orders.read().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        let mut orders = self
            .orders
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        let orders = self
            .orders
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(orders.get(id).cloned())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        orders
            .get_mut(&order.id)
            .ok_or_else(|| anyhow!("Order not found: {}", order.id))?;

        orders.insert(order.id, order.clone());

        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut orders = self
            .orders
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(orders.remove(id).is_some())
    }

    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let orders = self
            .orders
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching)
    }

    async fn latest_open_for_user(&self, user: &Uuid) -> Result<Option<Order>> {
        let open = self
            .find(&OrderFilter::for_user(*user).with_status(OrderStatus::New))
            .await?;

        Ok(open.into_iter().next())
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64> {
        let orders = self
            .orders
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(orders.values().filter(|order| filter.matches(order)).count() as u64)
    }
}

/// In-memory payment store.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored payment, unsorted. Test helper.
    pub fn all(&self) -> Vec<Payment> {
        self.payments.read().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self
            .payments
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        payments.insert(payment.id, payment.clone());

        Ok(payment)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Payment>> {
        let payments = self
            .payments
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(payments.get(id).cloned())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let mut payments = self
            .payments
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        payments
            .get_mut(&payment.id)
            .ok_or_else(|| anyhow!("Payment not found: {}", payment.id))?;

        payments.insert(payment.id, payment.clone());

        Ok(())
    }
}

/// In-memory product catalog, seeded through [`InMemoryProductCatalog::add`].
#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, product: Product) {
        self.products.write().unwrap().insert(product.id, product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get(&self, id: &Uuid) -> Result<Option<Product>> {
        let products = self
            .products
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(products.get(id).cloned())
    }
}

/// In-memory user directory, seeded through [`InMemoryUserDirectory::add`].
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get(&self, id: &Uuid) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(users.get(id).cloned())
    }
}
