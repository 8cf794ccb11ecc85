use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::pricing::PricingError;

/// Error types for registration operations
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Client-correctable problem with one field
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Selection became unavailable between quote and submit
    #[error("Selection unavailable: {0}")]
    Ineligible(String),

    #[error("An active registration already exists for this user")]
    AlreadyRegistered,

    #[error("Registration not found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid payment status transition: {0}")]
    InvalidTransition(String),

    /// Store or network failure; the same submission may be retried
    #[error("Submission failed: {0}")]
    Transient(String),
}

impl RegistrationError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        RegistrationError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistrationError::Transient(_))
    }
}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        RegistrationError::Transient(err.to_string())
    }
}

impl From<PricingError> for RegistrationError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::IneligibleSelection { .. } => {
                RegistrationError::Ineligible(err.to_string())
            }
            PricingError::NegativeAccompanyingCount(_) => {
                RegistrationError::validation("accompanying_count", err.to_string())
            }
            PricingError::InvalidConfiguration(_) | PricingError::DatabaseError(_) => {
                RegistrationError::Transient(err.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for RegistrationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, field_errors)) => {
                let message = field_errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string());
                RegistrationError::validation(field, message)
            }
            None => RegistrationError::validation("request", errors.to_string()),
        }
    }
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            RegistrationError::Validation { field, message } => {
                tracing::debug!("Registration validation failed on {}: {}", field, message);
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Validation error", "field": field, "message": message }),
                )
            }
            RegistrationError::Ineligible(details) => (
                StatusCode::CONFLICT,
                json!({ "error": "Selection unavailable", "details": details }),
            ),
            RegistrationError::AlreadyRegistered => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string() }),
            ),
            RegistrationError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Registration not found" }),
            ),
            RegistrationError::Forbidden(msg) => {
                tracing::warn!("Forbidden registration access: {}", msg);
                (StatusCode::FORBIDDEN, json!({ "error": msg }))
            }
            RegistrationError::InvalidTransition(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            RegistrationError::Transient(msg) => {
                tracing::error!("Registration submission failed: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "Registration service temporarily unavailable",
                        "retryable": true,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{BookingPhase, PackageType, UnavailableReason, UserCategory};
    use validator::Validate;

    #[test]
    fn test_pricing_errors_map_to_registration_errors() {
        let err: RegistrationError = PricingError::IneligibleSelection {
            category: UserCategory::AoaMember,
            phase: BookingPhase::Regular,
            package: PackageType::AoaCertifiedCourseOnly,
            reason: UnavailableReason::CourseFull,
        }
        .into();
        assert!(matches!(err, RegistrationError::Ineligible(_)));

        let err: RegistrationError = PricingError::NegativeAccompanyingCount(-2).into();
        assert!(
            matches!(err, RegistrationError::Validation { ref field, .. } if field == "accompanying_count")
        );

        let err: RegistrationError = PricingError::DatabaseError(sqlx::Error::PoolTimedOut).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_validation_errors_keep_field_and_message() {
        #[derive(Validate)]
        struct Probe {
            #[validate(range(min = 0, message = "must not be negative"))]
            count: i32,
        }

        let err: RegistrationError = Probe { count: -1 }.validate().unwrap_err().into();
        match err {
            RegistrationError::Validation { field, message } => {
                assert_eq!(field, "count");
                assert_eq!(message, "must not be negative");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (RegistrationError::validation("package_type", "required"), StatusCode::BAD_REQUEST),
            (RegistrationError::Ineligible("full".into()), StatusCode::CONFLICT),
            (RegistrationError::AlreadyRegistered, StatusCode::CONFLICT),
            (RegistrationError::NotFound, StatusCode::NOT_FOUND),
            (RegistrationError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (RegistrationError::Transient("down".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
