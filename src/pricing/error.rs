// Error types for conference pricing
// Covers selection checks, fee configuration and pricing collaborator failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pricing::types::{BookingPhase, PackageType, UnavailableReason, UserCategory};

/// Main error type for pricing operations
#[derive(Debug, Error)]
pub enum PricingError {
    /// The (category, phase, package) triple is not selectable right now
    #[error("{package} is not available for {category} during {phase}: {reason}")]
    IneligibleSelection {
        category: UserCategory,
        phase: BookingPhase,
        package: PackageType,
        reason: UnavailableReason,
    },

    /// Accompanying persons cannot be negative
    #[error("Accompanying person count cannot be negative, got {0}")]
    NegativeAccompanyingCount(i32),

    /// Fee configuration failed validation
    #[error("Invalid fee configuration: {0}")]
    InvalidConfiguration(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            PricingError::IneligibleSelection { .. } => {
                (StatusCode::CONFLICT, "Selection unavailable")
            }
            PricingError::NegativeAccompanyingCount(_) => {
                (StatusCode::BAD_REQUEST, "Validation error")
            }
            PricingError::InvalidConfiguration(ref msg) => {
                tracing::error!("Invalid fee configuration: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid fee configuration")
            }
            PricingError::DatabaseError(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Pricing unavailable")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PricingError::IneligibleSelection {
            category: UserCategory::PgsFellow,
            phase: BookingPhase::Spot,
            package: PackageType::Combo,
            reason: UnavailableReason::NotOfferedInPhase,
        };
        assert_eq!(
            error.to_string(),
            "COMBO is not available for PGS_FELLOW during SPOT: not offered in the current booking phase"
        );

        let error = PricingError::NegativeAccompanyingCount(-2);
        assert_eq!(
            error.to_string(),
            "Accompanying person count cannot be negative, got -2"
        );
    }

    #[test]
    fn test_error_from_sqlx() {
        let err: PricingError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, PricingError::DatabaseError(_)));
    }

    #[test]
    fn test_status_codes() {
        let response = PricingError::NegativeAccompanyingCount(-1).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = PricingError::IneligibleSelection {
            category: UserCategory::AoaMember,
            phase: BookingPhase::Regular,
            package: PackageType::AoaCertifiedCourseOnly,
            reason: UnavailableReason::CourseFull,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
