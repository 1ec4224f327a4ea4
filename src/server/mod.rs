//! HTTP surface: request/response types, handlers, and router assembly

pub mod handlers;
pub mod router;

pub use handlers::AppState;
pub use router::build_router;
