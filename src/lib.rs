//! # Tavola
//!
//! Food-ordering backend: the order/payment lifecycle over MongoDB behind
//! an Axum REST surface.
//!
//! ## Architecture
//!
//! - [`entities`] — orders, payments, and the read-only product/user
//!   collaborators
//! - [`storage`] — store traits with in-memory and MongoDB backends
//! - [`service`] — the lifecycle logic: cart validation against the
//!   catalog, payment recording, the `NEW → PAYED` transition, and
//!   ownership/role-scoped queries
//! - [`notify`] — best-effort receipt dispatch after an order is paid
//! - [`server`] — Axum handlers and router
//! - [`config`] — YAML + environment configuration
//!
//! Authentication happens upstream; the verified user id arrives in the
//! `x-user-id` header, and admin rights are checked against the user
//! directory per request.

pub mod config;
pub mod core;
pub mod entities;
pub mod notify;
pub mod server;
pub mod service;
pub mod storage;

pub use config::AppConfig;
pub use crate::core::{ApiError, ApiResult};
pub use server::{AppState, build_router};
pub use service::OrderService;
