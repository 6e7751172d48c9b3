//! API error type with JSON-RPC style codes and an HTTP status class.
//!
//! | Store error | Code | HTTP |
//! |-------------|------|------|
//! | `Validation` | -32602 | 422 |
//! | `Admission` | -32005 | 409 |
//! | `NotFound` | -32001 | 404 |
//! | `Internal` | -32603 | 500 |

use musig_store::StoreError;
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Error codes returned to callers.
pub mod codes {
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
    pub const LIMIT_EXCEEDED: i32 = -32005;
}

/// API error returned by the request handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    /// JSON-RPC error code
    pub code: i32,
    /// HTTP status a transport should answer with
    #[serde(skip)]
    pub status: u16,
    /// Error message
    pub message: String,
    /// Optional additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: i32, status: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            data: None,
        }
    }

    /// Invalid parameters or signatures
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_PARAMS,
            422,
            format!("Invalid params: {}", details.into()),
        )
    }

    /// Transaction not found
    pub fn resource_not_found(resource: impl Into<String>) -> Self {
        Self::new(
            codes::RESOURCE_NOT_FOUND,
            404,
            format!("Resource not found: {}", resource.into()),
        )
    }

    /// Sender reached its pending limit
    pub fn limit_exceeded(details: impl Into<String>, limit: usize) -> Self {
        let mut error = Self::new(
            codes::LIMIT_EXCEEDED,
            409,
            format!("Limit exceeded: {}", details.into()),
        );
        error.data = Some(serde_json::json!({ "limit": limit }));
        error
    }

    /// Internal error. Detail is never exposed.
    pub fn internal() -> Self {
        Self::new(codes::INTERNAL_ERROR, 500, "Internal error")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::invalid_params(msg),
            StoreError::Admission { sender, limit } => ApiError::limit_exceeded(
                format!("sender {} has {} pending transactions", sender, limit),
                limit,
            ),
            StoreError::NotFound(id) => ApiError::resource_not_found(format!("transaction {}", id)),
            StoreError::Internal(msg) => {
                error!(error = %msg, "Internal store error");
                ApiError::internal()
            }
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
