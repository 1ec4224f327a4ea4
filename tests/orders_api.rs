//! End-to-end tests for the order API.
//!
//! Runs the full HTTP surface against the in-memory backend: JSON request →
//! router → handler → service → stores → JSON response. The store handles
//! stay available to assert on persisted state.

use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use tavola::entities::{OrderStatus, PaymentStatus, Product, ProductVariant, User};
use tavola::notify::NoopReceiptSender;
use tavola::server::{AppState, build_router};
use tavola::service::OrderService;
use tavola::storage::{
    InMemoryOrderStore, InMemoryPaymentStore, InMemoryProductCatalog, InMemoryUserDirectory,
};

struct TestApp {
    server: TestServer,
    orders: Arc<InMemoryOrderStore>,
    payments: Arc<InMemoryPaymentStore>,
    product: Product,
    alice: User,
    bob: User,
    admin: User,
}

fn make_user(name: &str, is_admin: bool) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        is_admin,
    }
}

fn test_app() -> TestApp {
    let orders = Arc::new(InMemoryOrderStore::new());
    let payments = Arc::new(InMemoryPaymentStore::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let users = Arc::new(InMemoryUserDirectory::new());

    let product = Product {
        id: Uuid::new_v4(),
        name: "Margherita".to_string(),
        images: vec!["margherita.jpg".to_string()],
        variants: vec![
            ProductVariant {
                size: "S".to_string(),
                price: 5.49,
            },
            ProductVariant {
                size: "M".to_string(),
                price: 9.99,
            },
        ],
    };
    catalog.add(product.clone());

    let alice = make_user("Alice", false);
    let bob = make_user("Bob", false);
    let admin = make_user("Root", true);
    users.add(alice.clone());
    users.add(bob.clone());
    users.add(admin.clone());

    let service = OrderService::new(
        orders.clone(),
        payments.clone(),
        catalog,
        users,
        Arc::new(NoopReceiptSender),
    );

    let server = TestServer::new(build_router(AppState { orders: service }));

    TestApp {
        server,
        orders,
        payments,
        product,
        alice,
        bob,
        admin,
    }
}

fn valid_cart(app: &TestApp) -> Value {
    json!({
        "items": [
            { "product": app.product.id, "size": "M", "price": 9.99, "quantity": 2 }
        ],
        "totalPrice": 19.98
    })
}

impl TestApp {
    async fn create_order_as(&self, user: &User) -> Value {
        let response = self
            .server
            .post("/orders/create")
            .add_header("x-user-id", user.id.to_string())
            .json(&valid_cart(self))
            .await;
        response.assert_status_ok();
        response.json()
    }

    async fn pay_as(&self, user: &User, body: Value) -> Value {
        let response = self
            .server
            .put("/orders/pay")
            .add_header("x-user-id", user.id.to_string())
            .json(&body)
            .await;
        response.assert_status_ok();
        response.json()
    }
}

// ===========================================================================
// Order creation
// ===========================================================================

#[tokio::test]
async fn test_create_order_with_valid_cart() {
    let app = test_app();

    let body = app.create_order_as(&app.alice).await;

    assert_eq!(body["status"], "NEW");
    assert_eq!(body["total_price"], 19.98);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["size"], "M");
    assert_eq!(body["user"], app.alice.id.to_string());

    let stored = app.orders.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.to_string(), body["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_create_order_rejects_empty_cart() {
    let app = test_app();

    let response = app
        .server
        .post("/orders/create")
        .add_header("x-user-id", app.alice.id.to_string())
        .json(&json!({ "items": [], "totalPrice": 0.0 }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("empty"));
    assert!(app.orders.all().is_empty());
}

#[tokio::test]
async fn test_create_order_rejects_price_mismatch() {
    let app = test_app();

    let response = app
        .server
        .post("/orders/create")
        .add_header("x-user-id", app.alice.id.to_string())
        .json(&json!({
            "items": [
                { "product": app.product.id, "size": "M", "price": 7.99, "quantity": 1 }
            ],
            "totalPrice": 7.99
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("Price mismatch"));
    assert!(app.orders.all().is_empty());
}

#[tokio::test]
async fn test_create_order_rejects_unknown_product() {
    let app = test_app();

    let response = app
        .server
        .post("/orders/create")
        .add_header("x-user-id", app.alice.id.to_string())
        .json(&json!({
            "items": [
                { "product": Uuid::new_v4(), "size": "M", "price": 9.99, "quantity": 1 }
            ],
            "totalPrice": 9.99
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("Invalid product"));
}

#[tokio::test]
async fn test_create_order_rejects_unknown_size() {
    let app = test_app();

    let response = app
        .server
        .post("/orders/create")
        .add_header("x-user-id", app.alice.id.to_string())
        .json(&json!({
            "items": [
                { "product": app.product.id, "size": "XXL", "price": 9.99, "quantity": 1 }
            ],
            "totalPrice": 9.99
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("Invalid size"));
}

#[tokio::test]
async fn test_create_order_requires_auth() {
    let app = test_app();

    let response = app.server.post("/orders/create").json(&valid_cart(&app)).await;

    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Payment recording
// ===========================================================================

#[tokio::test]
async fn test_pay_completed_transitions_order_to_payed() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let body = app
        .pay_as(
            &app.alice,
            json!({ "paymentId": "tx_1", "status": "COMPLETED" }),
        )
        .await;

    assert_eq!(body["orderId"], order["id"]);
    assert_eq!(body["paymentStatus"], "COMPLETED");

    let stored = app.orders.all().pop().unwrap();
    assert_eq!(stored.status, OrderStatus::Payed);
    assert_eq!(stored.payment_id.as_deref(), Some("tx_1"));

    let payments = app.payments.all();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount, 19.98);
    assert_eq!(payments[0].method, "PayPal");
    assert_eq!(payments[0].status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_pay_defaults_to_completed_paypal() {
    let app = test_app();
    app.create_order_as(&app.alice).await;

    let body = app.pay_as(&app.alice, json!({ "paymentId": "tx_2" })).await;

    assert_eq!(body["paymentStatus"], "COMPLETED");
    let payments = app.payments.all();
    assert_eq!(payments[0].method, "PayPal");
}

#[tokio::test]
async fn test_pay_pending_leaves_order_open() {
    let app = test_app();
    app.create_order_as(&app.alice).await;

    let body = app
        .pay_as(
            &app.alice,
            json!({ "paymentId": "tx_3", "status": "PENDING" }),
        )
        .await;

    assert_eq!(body["paymentStatus"], "PENDING");

    let stored = app.orders.all().pop().unwrap();
    assert_eq!(stored.status, OrderStatus::New);
    assert!(stored.payment_id.is_none());
    assert_eq!(app.payments.all().len(), 1);
}

#[tokio::test]
async fn test_pay_without_open_order_is_bad_request() {
    let app = test_app();

    let response = app
        .server
        .put("/orders/pay")
        .add_header("x-user-id", app.alice.id.to_string())
        .json(&json!({ "paymentId": "tx_4" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert!(app.payments.all().is_empty());
}

#[tokio::test]
async fn test_pay_ignores_client_supplied_amount() {
    let app = test_app();
    app.create_order_as(&app.alice).await;

    app.pay_as(
        &app.alice,
        json!({ "paymentId": "tx_5", "amount": 0.01, "status": "COMPLETED" }),
    )
    .await;

    let payments = app.payments.all();
    assert_eq!(payments[0].amount, 19.98);
}

// ===========================================================================
// Tracking and queries
// ===========================================================================

#[tokio::test]
async fn test_track_own_order_resolves_products() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .get(&format!("/orders/track/{}", order["id"].as_str().unwrap()))
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"][0]["product"]["name"], "Margherita");
    assert_eq!(body["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_track_foreign_order_is_not_found() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .get(&format!("/orders/track/{}", order["id"].as_str().unwrap()))
        .add_header("x-user-id", app.bob.id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_track_as_admin_sees_any_order() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .get(&format!("/orders/track/{}", order["id"].as_str().unwrap()))
        .add_header("x-user-id", app.admin.id.to_string())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_scopes_to_caller_and_sorts_newest_first() {
    let app = test_app();
    let first = app.create_order_as(&app.alice).await;
    app.pay_as(&app.alice, json!({ "paymentId": "tx_6" })).await;
    let second = app.create_order_as(&app.alice).await;
    app.create_order_as(&app.bob).await;

    let response = app
        .server
        .get("/orders")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], second["id"]);
    assert_eq!(listed[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let app = test_app();
    app.create_order_as(&app.alice).await;
    app.pay_as(&app.alice, json!({ "paymentId": "tx_7" })).await;
    app.create_order_as(&app.alice).await;

    let response = app
        .server
        .get("/orders/PAYED")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "PAYED");
}

#[tokio::test]
async fn test_list_rejects_unknown_status() {
    let app = test_app();

    let response = app
        .server
        .get("/orders/SHOUTING")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_catalog() {
    let app = test_app();

    let response = app
        .server
        .get("/orders/allstatus")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body,
        json!(["NEW", "PAYED", "SHIPPED", "DELIVERED", "CANCELLED"])
    );
}

#[tokio::test]
async fn test_current_open_order_returns_populated_view() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .get("/orders/newOrderForCurrentUser")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], order["id"]);
    assert_eq!(body["customer"]["name"], "Alice");
    assert_eq!(body["items"][0]["product"]["name"], "Margherita");
}

#[tokio::test]
async fn test_current_open_order_not_found_when_none() {
    let app = test_app();

    let response = app
        .server
        .get("/orders/newOrderForCurrentUser")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_purchase_count_counts_payed_orders() {
    let app = test_app();
    app.create_order_as(&app.alice).await;
    app.pay_as(&app.alice, json!({ "paymentId": "tx_8" })).await;
    app.create_order_as(&app.alice).await;

    let response = app
        .server
        .get("/orders/user-purchase-count")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_get_order_by_id_missing_is_not_found() {
    let app = test_app();

    let response = app
        .server
        .get(&format!("/orders/order/{}", Uuid::new_v4()))
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

// ===========================================================================
// Admin listing
// ===========================================================================

#[tokio::test]
async fn test_admin_list_requires_admin_role() {
    let app = test_app();

    let response = app
        .server
        .get("/orders/orders")
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_list_filters_by_user_and_status() {
    let app = test_app();
    app.create_order_as(&app.alice).await;
    app.pay_as(&app.alice, json!({ "paymentId": "tx_9" })).await;
    app.create_order_as(&app.bob).await;

    let response = app
        .server
        .get(&format!(
            "/orders/orders?user={}&status=PAYED",
            app.alice.id
        ))
        .add_header("x-user-id", app.admin.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["status"], "PAYED");
    assert_eq!(listed[0]["customer"]["name"], "Alice");
}

#[tokio::test]
async fn test_admin_list_time_range_is_inclusive() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;
    let created_at = order["created_at"].as_str().unwrap();

    let response = app
        .server
        .get(&format!(
            "/orders/orders?from={}&to={}",
            urlencode(created_at),
            urlencode(created_at)
        ))
        .add_header("x-user-id", app.admin.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

fn urlencode(value: &str) -> String {
    value.replace('+', "%2B").replace(':', "%3A")
}

// ===========================================================================
// Admin mutations
// ===========================================================================

#[tokio::test]
async fn test_admin_force_order_status() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .patch(&format!(
            "/orders/order/{}/status",
            order["id"].as_str().unwrap()
        ))
        .add_header("x-user-id", app.admin.id.to_string())
        .json(&json!({ "status": "CANCELLED" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(
        app.orders.all().pop().unwrap().status,
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn test_admin_force_order_status_rejects_unknown_value() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .patch(&format!(
            "/orders/order/{}/status",
            order["id"].as_str().unwrap()
        ))
        .add_header("x-user-id", app.admin.id.to_string())
        .json(&json!({ "status": "TELEPORTED" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_force_order_status_missing_order() {
    let app = test_app();

    let response = app
        .server
        .patch(&format!("/orders/order/{}/status", Uuid::new_v4()))
        .add_header("x-user-id", app.admin.id.to_string())
        .json(&json!({ "status": "PAYED" }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_completing_payment_settles_linked_order() {
    let app = test_app();
    app.create_order_as(&app.alice).await;
    let pay = app
        .pay_as(
            &app.alice,
            json!({ "paymentId": "tx_10", "status": "PENDING" }),
        )
        .await;

    let response = app
        .server
        .patch(&format!(
            "/orders/payment/{}/status",
            pay["paymentId"].as_str().unwrap()
        ))
        .add_header("x-user-id", app.admin.id.to_string())
        .json(&json!({ "status": "COMPLETED" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "COMPLETED");

    let order = app.orders.all().pop().unwrap();
    assert_eq!(order.status, OrderStatus::Payed);
    assert_eq!(order.payment_id.as_deref(), Some("tx_10"));
}

#[tokio::test]
async fn test_patch_payment_status_forbidden_for_regular_user() {
    let app = test_app();

    let response = app
        .server
        .patch(&format!("/orders/payment/{}/status", Uuid::new_v4()))
        .add_header("x-user-id", app.bob.id.to_string())
        .json(&json!({ "status": "COMPLETED" }))
        .await;

    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

// ===========================================================================
// Deletion
// ===========================================================================

#[tokio::test]
async fn test_delete_order() {
    let app = test_app();
    let order = app.create_order_as(&app.alice).await;

    let response = app
        .server
        .delete(&format!("/orders/{}", order["id"].as_str().unwrap()))
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Order deleted successfully");
    assert!(app.orders.all().is_empty());
}

#[tokio::test]
async fn test_delete_missing_order_leaves_payments_untouched() {
    let app = test_app();
    app.create_order_as(&app.alice).await;
    app.pay_as(&app.alice, json!({ "paymentId": "tx_11" })).await;

    let response = app
        .server
        .delete(&format!("/orders/{}", Uuid::new_v4()))
        .add_header("x-user-id", app.alice.id.to_string())
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    assert_eq!(app.payments.all().len(), 1);
}
