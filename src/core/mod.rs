//! Cross-cutting API concerns: error taxonomy and caller identity

pub mod auth;
pub mod error;

pub use auth::{USER_ID_HEADER, caller};
pub use error::{ApiError, ApiResult, ErrorResponse};
