//! Caller identity extraction
//!
//! Authentication itself happens upstream (gateway middleware); by the time
//! a request reaches this service, the verified user id travels in the
//! `x-user-id` header. Role checks go through the user directory in the
//! service layer, so a forged admin flag cannot arrive from the client.

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::core::error::ApiError;

/// Header carrying the authenticated user id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extract the authenticated caller from request headers.
pub fn caller(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("invalid {} header", USER_ID_HEADER)))?;

    Uuid::parse_str(value)
        .map_err(|_| ApiError::Unauthorized(format!("invalid {} header", USER_ID_HEADER)))
}
