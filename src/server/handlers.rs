//! HTTP handlers for the order API
//!
//! Handlers stay thin: extract the caller, validate the request shape,
//! delegate to [`OrderService`], and let [`ApiError`] render failures.
//! Field names the external interface promises in camelCase are mapped on
//! the request/response types here; persisted entities serialize as-is.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::{ApiError, auth};
use crate::entities::{Order, OrderItem, OrderStatus, Payment, PaymentStatus};
use crate::service::{OrderService, OrderView, PayOutcome};
use crate::storage::OrderFilter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
}

// ===========================================================================
// Request / response types
// ===========================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct OrderItemRequest {
    pub product: Uuid,
    pub size: String,
    pub price: f64,
    pub quantity: u32,
}

impl From<OrderItemRequest> for OrderItem {
    fn from(item: OrderItemRequest) -> Self {
        OrderItem {
            product: item.product,
            size: item.size,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Cart is empty"))]
    pub items: Vec<OrderItemRequest>,
    pub total_price: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    #[validate(length(min = 1, message = "Payment id is required"))]
    pub payment_id: String,
    pub method: Option<String>,
    /// Accepted for wire compatibility; the recorded amount always copies
    /// the order's total.
    #[serde(default)]
    pub amount: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    pub order_id: Uuid,
    pub payment_id: Uuid,
    pub payment_status: PaymentStatus,
}

impl From<PayOutcome> for PayResponse {
    fn from(outcome: PayOutcome) -> Self {
        PayResponse {
            order_id: outcome.order_id,
            payment_id: outcome.payment_id,
            payment_status: outcome.payment_status,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AdminListQuery {
    pub user: Option<Uuid>,
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseCountResponse {
    pub count: u64,
}

fn parse_order_status(value: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::parse(value)
        .ok_or_else(|| ApiError::validation(format!("Unknown order status '{}'", value)))
}

fn parse_payment_status(value: &str) -> Result<PaymentStatus, ApiError> {
    PaymentStatus::parse(value)
        .ok_or_else(|| ApiError::validation(format!("Unknown payment status '{}'", value)))
}

// ===========================================================================
// Order lifecycle
// ===========================================================================

/// POST /orders/create
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    let caller = auth::caller(&headers)?;
    request.validate()?;

    let items = request.items.into_iter().map(Into::into).collect();
    let order = state
        .orders
        .create_order(caller, items, request.total_price)
        .await?;

    Ok(Json(order))
}

/// PUT /orders/pay
pub async fn pay(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PayRequest>,
) -> Result<Json<PayResponse>, ApiError> {
    let caller = auth::caller(&headers)?;
    request.validate()?;

    let status = request
        .status
        .as_deref()
        .map(parse_payment_status)
        .transpose()?;

    let outcome = state
        .orders
        .pay(caller, request.payment_id, request.method, status)
        .await?;

    Ok(Json(outcome.into()))
}

/// DELETE /orders/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth::caller(&headers)?;

    let id = Uuid::parse_str(&id).map_err(|_| ApiError::validation("Invalid order id"))?;
    state.orders.delete_order(id).await?;

    Ok(Json(MessageResponse {
        message: "Order deleted successfully".to_string(),
    }))
}

// ===========================================================================
// Queries
// ===========================================================================

/// GET /orders/track/{order_id}
pub async fn track_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    let caller = auth::caller(&headers)?;
    let view = state.orders.track(caller, order_id).await?;
    Ok(Json(view))
}

/// GET /orders
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let caller = auth::caller(&headers)?;
    let views = state.orders.list(caller, None).await?;
    Ok(Json(views))
}

/// GET /orders/{status}
pub async fn list_orders_by_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(status): Path<String>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let caller = auth::caller(&headers)?;
    let status = parse_order_status(&status)?;
    let views = state.orders.list(caller, Some(status)).await?;
    Ok(Json(views))
}

/// GET /orders/orders (admin)
pub async fn admin_list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let caller = auth::caller(&headers)?;

    let status = query.status.as_deref().map(parse_order_status).transpose()?;
    let filter = OrderFilter {
        user: query.user,
        status,
        created_from: query.from,
        created_to: query.to,
    };

    let views = state.orders.admin_list(caller, filter).await?;
    Ok(Json(views))
}

/// GET /orders/allstatus
pub async fn all_statuses(headers: HeaderMap) -> Result<Json<Vec<OrderStatus>>, ApiError> {
    auth::caller(&headers)?;
    Ok(Json(OrderStatus::all().to_vec()))
}

/// GET /orders/newOrderForCurrentUser
pub async fn current_open_order(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OrderView>, ApiError> {
    let caller = auth::caller(&headers)?;
    let view = state.orders.current_open_order(caller).await?;
    Ok(Json(view))
}

/// GET /orders/user-purchase-count
pub async fn purchase_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PurchaseCountResponse>, ApiError> {
    let caller = auth::caller(&headers)?;
    let count = state.orders.purchase_count(caller).await?;
    Ok(Json(PurchaseCountResponse { count }))
}

/// GET /orders/order/{id}
pub async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    auth::caller(&headers)?;
    let view = state.orders.get_order(id).await?;
    Ok(Json(view))
}

// ===========================================================================
// Admin mutations
// ===========================================================================

/// PATCH /orders/order/{id}/status (admin)
pub async fn set_order_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    let caller = auth::caller(&headers)?;
    let status = parse_order_status(&request.status)?;
    let order = state.orders.set_order_status(caller, id, status).await?;
    Ok(Json(order))
}

/// PATCH /orders/payment/{id}/status (admin)
pub async fn set_payment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Payment>, ApiError> {
    let caller = auth::caller(&headers)?;
    let status = parse_payment_status(&request.status)?;
    let payment = state.orders.set_payment_status(caller, id, status).await?;
    Ok(Json(payment))
}
