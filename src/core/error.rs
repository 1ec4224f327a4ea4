//! Typed error handling for the order API
//!
//! Every failure a handler can produce maps onto one of these variants,
//! which carry their HTTP status and a stable machine-readable code.
//!
//! - [`ApiError::Validation`]: malformed or business-rule-violating input → 400
//! - [`ApiError::NotFound`]: referenced entity absent (or hidden from the caller) → 404
//! - [`ApiError::Unauthorized`]: caller identity missing or unparseable → 401
//! - [`ApiError::Forbidden`]: caller lacks the required role → 403
//! - [`ApiError::Storage`]: database failure → 500, logged, generic body
//! - [`ApiError::Internal`]: should not happen in normal operation → 500

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The error type returned by the service and handler layers.
#[derive(Debug)]
pub enum ApiError {
    /// Input violates a validation or business rule
    Validation(String),

    /// Referenced entity absent, or not visible to the caller
    NotFound { resource: &'static str, id: String },

    /// Caller identity missing or unparseable
    Unauthorized(String),

    /// Caller lacks the required role
    Forbidden(String),

    /// Storage backend failure
    Storage(String),

    /// Internal error
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to the serialized response body.
    ///
    /// Storage and internal details stay in the logs; callers get a
    /// generic message.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ApiError::Storage(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        ErrorResponse {
            code: self.error_code().to_string(),
            message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(message) => write!(f, "{}", message),
            ApiError::NotFound { resource, id } => {
                write!(f, "{} '{}' not found", resource, id)
            }
            ApiError::Unauthorized(message) => write!(f, "Unauthorized: {}", message),
            ApiError::Forbidden(message) => write!(f, "Forbidden: {}", message),
            ApiError::Storage(message) => write!(f, "Storage error: {}", message),
            ApiError::Internal(message) => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Storage(_) | ApiError::Internal(_)) {
            tracing::error!(error = %self, "request failed");
        }
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

/// Storage-layer failures surface as anyhow errors and map to 500s.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut parts = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                match &err.message {
                    Some(message) => parts.push(message.to_string()),
                    None => parts.push(format!("invalid value for '{}'", field)),
                }
            }
        }
        ApiError::Validation(parts.join(", "))
    }
}

/// A specialized Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
