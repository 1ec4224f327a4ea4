//! Router assembly
//!
//! Static segments (`create`, `pay`, `track`, ...) are registered before
//! and win over the parameterized `/orders/{status}` route, which carries
//! both the status-filtered listing (GET) and delete-by-id (DELETE) — the
//! two operations the original interface overlays on that segment.

use axum::Router;
use axum::routing::{get, patch, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{self, AppState};

/// Build the application router with tracing and CORS layers applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/orders/create", post(handlers::create_order))
        .route("/orders/pay", put(handlers::pay))
        .route("/orders/track/{order_id}", get(handlers::track_order))
        .route(
            "/orders/newOrderForCurrentUser",
            get(handlers::current_open_order),
        )
        .route("/orders/allstatus", get(handlers::all_statuses))
        .route(
            "/orders/user-purchase-count",
            get(handlers::purchase_count),
        )
        .route("/orders/orders", get(handlers::admin_list_orders))
        .route("/orders/order/{id}", get(handlers::get_order))
        .route(
            "/orders/order/{id}/status",
            patch(handlers::set_order_status),
        )
        .route(
            "/orders/payment/{id}/status",
            patch(handlers::set_payment_status),
        )
        .route("/orders", get(handlers::list_orders))
        .route(
            "/orders/{status}",
            get(handlers::list_orders_by_status).delete(handlers::delete_order),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
