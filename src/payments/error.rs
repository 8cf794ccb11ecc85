use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::registrations::{PaymentStatus, RegistrationError};

/// Error types for payment checkout
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payment gateway returned HTTP {status}: {body}")]
    Gateway { status: u16, body: String },

    #[error("Invalid payment gateway response: {0}")]
    InvalidResponse(String),

    /// The gateway would charge a different amount than was registered
    #[error("Gateway amount {charged} does not match registration total {expected}")]
    AmountMismatch { expected: Decimal, charged: Decimal },

    #[error("Checkout is not allowed while payment is {0}")]
    CheckoutNotAllowed(PaymentStatus),

    #[error("Invalid payment gateway configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl PaymentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Http(_) | PaymentError::Gateway { .. } | PaymentError::InvalidResponse(_) => {
                true
            }
            PaymentError::Registration(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            PaymentError::Registration(inner) => return inner.into_response(),
            err @ (PaymentError::Http(_)
            | PaymentError::Gateway { .. }
            | PaymentError::InvalidResponse(_)) => {
                tracing::error!("Payment gateway failure: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Payment gateway unavailable", "retryable": true }),
                )
            }
            err @ PaymentError::AmountMismatch { .. } => {
                tracing::error!("Payment reconciliation failed: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "Payment amount could not be reconciled",
                        "details": err.to_string(),
                    }),
                )
            }
            err @ PaymentError::CheckoutNotAllowed(_) => {
                (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
            }
            PaymentError::Configuration(msg) => {
                tracing::error!("Payment gateway misconfigured: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Payment gateway misconfigured" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_codes() {
        let response = PaymentError::AmountMismatch {
            expected: dec!(23000),
            charged: dec!(16000),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = PaymentError::CheckoutNotAllowed(PaymentStatus::Paid).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = PaymentError::Gateway {
            status: 502,
            body: "upstream".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = PaymentError::Registration(RegistrationError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_retryable() {
        assert!(PaymentError::InvalidResponse("truncated".into()).is_retryable());
        assert!(!PaymentError::CheckoutNotAllowed(PaymentStatus::Refunded).is_retryable());
        assert!(PaymentError::Registration(RegistrationError::Transient("db".into())).is_retryable());
    }
}
