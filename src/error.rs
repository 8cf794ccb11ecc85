// Application-level error handling
// Uniform error body for failures outside the domain modules, plus the
// startup error returned by `main`

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use std::any::Any;
use tracing::{debug, error};

use crate::config::ConfigError;
use crate::payments::PaymentError;

/// Errors raised by the application shell rather than a domain module
#[derive(Debug)]
pub enum ApiError {
    /// No route or resource matches the request
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error; details stay in the logs
    InternalError(String),
}

/// Consistent error response structure
///
/// `error_code` is machine-readable, `message` is for humans.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} {}", resource, id);

                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error_code: "NOT_FOUND".to_string(),
                        message: format!("{} {} not found", resource, id),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred".to_string(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fallback for requests that match no route
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "Route".to_string(),
        id: uri.path().to_string(),
    }
}

/// Response for a handler that panicked, installed with `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::InternalError(format!("Handler panicked: {}", detail)).into_response()
}

/// Reasons the server can fail to start
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Pricing setup failed: {0}")]
    Pricing(#[from] crate::pricing::PricingError),

    #[error("Payment gateway setup failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = ApiError::NotFound {
            resource: "Route".to_string(),
            id: "/api/nowhere".to_string(),
        };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InternalError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let (_, body) = ApiError::InternalError("connection reset by peer".into()).to_error_response();
        assert_eq!(body.error_code, "INTERNAL_ERROR");
        assert!(!body.message.contains("connection reset"));
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let response = panic_response(Box::new("index out of bounds"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(String::from("lock poisoned")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
