//! Order service: the order/payment lifecycle
//!
//! This is the one stateful piece of the system. It validates carts against
//! the product catalog, creates orders, records payment attempts, drives the
//! `NEW → PAYED` transition, and answers queries scoped by ownership and
//! role. Everything else in the backend is pass-through CRUD and lives in
//! the services that own those collections.
//!
//! Writes are single-document and unguarded: two racing completed payments
//! for the same order both succeed, and the second `PAYED` write is
//! idempotent in effect. Receipt dispatch is spawned after the transition
//! and never blocks or fails the pay response.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::core::{ApiError, ApiResult};
use crate::entities::{Order, OrderItem, OrderStatus, Payment, PaymentStatus, Product, User};
use crate::notify::ReceiptSender;
use crate::storage::{OrderFilter, OrderStore, PaymentStore, ProductCatalog, UserDirectory};

/// Payment method recorded when the pay request does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "PayPal";

/// Result of recording a payment attempt.
#[derive(Debug, Clone, Copy)]
pub struct PayOutcome {
    pub order_id: Uuid,
    pub payment_id: Uuid,
    pub payment_status: PaymentStatus,
}

/// An order item with its catalog product resolved for display.
///
/// `product` is `None` when the catalog entry has been removed since the
/// order was placed.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub product: Option<Product>,
    pub size: String,
    pub price: f64,
    pub quantity: u32,
}

/// An order with product (and optionally user) details resolved.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub user: Uuid,
    /// Owning user's directory entry; only resolved on views that need it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<User>,
    pub items: Vec<OrderItemView>,
    pub status: OrderStatus,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// The order/payment lifecycle service.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    catalog: Arc<dyn ProductCatalog>,
    users: Arc<dyn UserDirectory>,
    receipts: Arc<dyn ReceiptSender>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        catalog: Arc<dyn ProductCatalog>,
        users: Arc<dyn UserDirectory>,
        receipts: Arc<dyn ReceiptSender>,
    ) -> Self {
        Self {
            orders,
            payments,
            catalog,
            users,
            receipts,
        }
    }

    // -----------------------------------------------------------------------
    // Order creation
    // -----------------------------------------------------------------------

    /// Validate a cart against the catalog and persist it as a `NEW` order.
    ///
    /// Validation fails fast with the first violated rule. `total_price` is
    /// persisted as supplied; only the per-item unit prices are checked
    /// against the catalog.
    pub async fn create_order(
        &self,
        caller: Uuid,
        items: Vec<OrderItem>,
        total_price: f64,
    ) -> ApiResult<Order> {
        if items.is_empty() {
            return Err(ApiError::validation("Cart is empty"));
        }

        let mut resolved = HashSet::new();
        for item in &items {
            let product = self
                .catalog
                .get(&item.product)
                .await?
                .ok_or_else(|| ApiError::validation("Invalid product in cart"))?;
            let variant = product
                .variant(&item.size)
                .ok_or_else(|| ApiError::validation("Invalid size for product"))?;
            if variant.price != item.price {
                return Err(ApiError::validation("Price mismatch"));
            }
            resolved.insert(item.product);
        }

        // Defensive second pass: drop lines whose product did not resolve.
        let items: Vec<OrderItem> = items
            .into_iter()
            .filter(|item| resolved.contains(&item.product))
            .collect();
        if items.is_empty() {
            return Err(ApiError::validation("No valid products in cart"));
        }

        let order = Order::new(caller, items, total_price);
        Ok(self.orders.insert(order).await?)
    }

    // -----------------------------------------------------------------------
    // Payment recording
    // -----------------------------------------------------------------------

    /// Record a payment attempt against the caller's open order.
    ///
    /// A payment record is persisted for every attempt, whatever its status.
    /// Only a `COMPLETED` attempt transitions the order to `PAYED` and
    /// triggers the receipt dispatch.
    pub async fn pay(
        &self,
        caller: Uuid,
        payment_id: String,
        method: Option<String>,
        status: Option<PaymentStatus>,
    ) -> ApiResult<PayOutcome> {
        let method = method.unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        let status = status.unwrap_or(PaymentStatus::Completed);

        let mut order = self
            .orders
            .latest_open_for_user(&caller)
            .await?
            .ok_or_else(|| ApiError::validation("Order not found"))?;

        let payment = Payment::new(
            order.id,
            caller,
            payment_id.clone(),
            method,
            order.total_price,
            status,
        );
        let payment = self.payments.insert(payment).await?;

        if status == PaymentStatus::Completed {
            order.mark_paid(&payment_id);
            self.orders.update(&order).await?;
            self.dispatch_receipt(order.clone());
        }

        Ok(PayOutcome {
            order_id: order.id,
            payment_id: payment.id,
            payment_status: status,
        })
    }

    /// Fire-and-forget receipt dispatch. Failures are logged and swallowed;
    /// the completed transition is never rolled back.
    fn dispatch_receipt(&self, order: Order) {
        let users = Arc::clone(&self.users);
        let receipts = Arc::clone(&self.receipts);
        tokio::spawn(async move {
            let customer = match users.get(&order.user).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    warn!(order = %order.id, user = %order.user, "receipt skipped: unknown user");
                    return;
                }
                Err(err) => {
                    warn!(order = %order.id, error = %err, "receipt skipped: directory lookup failed");
                    return;
                }
            };
            if let Err(err) = receipts.send_receipt(&order, &customer).await {
                warn!(order = %order.id, error = %err, "receipt dispatch failed");
            }
        });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Fetch one order for tracking, scoped to the caller unless admin.
    ///
    /// Missing and not-owned collapse into the same 404 so order ids are
    /// not probeable.
    pub async fn track(&self, caller: Uuid, order_id: Uuid) -> ApiResult<OrderView> {
        let admin = self.is_admin(&caller).await?;
        let order = match self.orders.get(&order_id).await? {
            Some(order) if admin || order.user == caller => order,
            _ => return Err(ApiError::not_found("order", order_id)),
        };
        self.populate(order, false).await
    }

    /// List the caller's orders (all orders when admin), optionally
    /// filtered by status, newest first.
    pub async fn list(
        &self,
        caller: Uuid,
        status: Option<OrderStatus>,
    ) -> ApiResult<Vec<OrderView>> {
        let admin = self.is_admin(&caller).await?;
        let filter = OrderFilter {
            user: (!admin).then_some(caller),
            status,
            ..OrderFilter::default()
        };
        let orders = self.orders.find(&filter).await?;
        self.populate_many(orders, false).await
    }

    /// Admin listing across all users with optional user/status/time filters.
    pub async fn admin_list(&self, caller: Uuid, filter: OrderFilter) -> ApiResult<Vec<OrderView>> {
        self.require_admin(&caller).await?;
        let orders = self.orders.find(&filter).await?;
        self.populate_many(orders, true).await
    }

    /// The caller's current open (`NEW`) order, most recent first.
    pub async fn current_open_order(&self, caller: Uuid) -> ApiResult<OrderView> {
        let order = self
            .orders
            .latest_open_for_user(&caller)
            .await?
            .ok_or_else(|| ApiError::not_found("open order for user", caller))?;
        self.populate(order, true).await
    }

    /// Count of the caller's `PAYED` orders.
    pub async fn purchase_count(&self, caller: Uuid) -> ApiResult<u64> {
        Ok(self
            .orders
            .count(&OrderFilter::for_user(caller).with_status(OrderStatus::Payed))
            .await?)
    }

    /// Fetch one order by id with product details, unscoped.
    pub async fn get_order(&self, order_id: Uuid) -> ApiResult<OrderView> {
        let order = self
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("order", order_id))?;
        self.populate(order, false).await
    }

    // -----------------------------------------------------------------------
    // Admin mutations
    // -----------------------------------------------------------------------

    /// Overwrite an order's status. Arbitrary transitions are allowed here;
    /// this is the operator escape hatch.
    pub async fn set_order_status(
        &self,
        caller: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> ApiResult<Order> {
        self.require_admin(&caller).await?;

        let mut order = self
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("order", order_id))?;

        order.status = status;
        order.touch();
        self.orders.update(&order).await?;

        Ok(order)
    }

    /// Overwrite a payment's status. Completing a payment settles its order
    /// too, unless already settled. No receipt goes out on this path.
    pub async fn set_payment_status(
        &self,
        caller: Uuid,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> ApiResult<Payment> {
        self.require_admin(&caller).await?;

        let mut payment = self
            .payments
            .get(&payment_id)
            .await?
            .ok_or_else(|| ApiError::not_found("payment", payment_id))?;

        payment.status = status;
        self.payments.update(&payment).await?;

        if status == PaymentStatus::Completed
            && let Some(mut order) = self.orders.get(&payment.order).await?
            && order.status != OrderStatus::Payed
        {
            order.mark_paid(&payment.payment_id);
            self.orders.update(&order).await?;
        }

        Ok(payment)
    }

    /// Delete an order permanently. Its payment records are kept.
    pub async fn delete_order(&self, order_id: Uuid) -> ApiResult<()> {
        if !self.orders.delete(&order_id).await? {
            return Err(ApiError::not_found("order", order_id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn is_admin(&self, user: &Uuid) -> ApiResult<bool> {
        Ok(self.users.get(user).await?.is_some_and(|u| u.is_admin))
    }

    async fn require_admin(&self, user: &Uuid) -> ApiResult<()> {
        if self.is_admin(user).await? {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }

    /// Resolve product (and optionally user) references into a view.
    async fn populate(&self, order: Order, include_customer: bool) -> ApiResult<OrderView> {
        let mut products: HashMap<Uuid, Product> = HashMap::new();
        for item in &order.items {
            if !products.contains_key(&item.product)
                && let Some(product) = self.catalog.get(&item.product).await?
            {
                products.insert(item.product, product);
            }
        }

        let customer = if include_customer {
            self.users.get(&order.user).await?
        } else {
            None
        };

        let items = order
            .items
            .into_iter()
            .map(|item| OrderItemView {
                product: products.get(&item.product).cloned(),
                size: item.size,
                price: item.price,
                quantity: item.quantity,
            })
            .collect();

        Ok(OrderView {
            id: order.id,
            user: order.user,
            customer,
            items,
            status: order.status,
            total_price: order.total_price,
            payment_id: order.payment_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }

    async fn populate_many(
        &self,
        orders: Vec<Order>,
        include_customer: bool,
    ) -> ApiResult<Vec<OrderView>> {
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.populate(order, include_customer).await?);
        }
        Ok(views)
    }
}
