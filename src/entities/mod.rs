//! Domain entities: orders, payments, and their read-only collaborators

pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderStatus};
pub use payment::{Payment, PaymentStatus};
pub use product::{Product, ProductVariant};
pub use user::User;
