// Bearer-token verification and role check failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::models::Role;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    /// Only reachable through locally issued development tokens
    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Role '{required}' required, caller has '{actual}'")]
    InsufficientPermissions { required: Role, actual: Role },
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller
    pub fn error_message(&self) -> String {
        match self {
            AuthError::TokenGenerationError(_) => "Internal server error".to_string(),
            AuthError::InsufficientPermissions { required, .. } => {
                format!("This endpoint requires the '{}' role", required)
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::TokenGenerationError(msg) => tracing::error!("Token generation error: {}", msg),
            other => tracing::warn!("Rejected request: {}", other),
        }

        let status = self.status_code();
        (status, Json(json!({ "error": self.error_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientPermissions {
                required: Role::Admin,
                actual: Role::Attendee
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_error_message_hides_internal_detail() {
        let err = AuthError::TokenGenerationError("key too short".to_string());
        assert_eq!(err.error_message(), "Internal server error");
        assert!(err.to_string().contains("key too short"));
    }

    #[test]
    fn test_forbidden_message_names_required_role() {
        let err = AuthError::InsufficientPermissions {
            required: Role::Admin,
            actual: Role::Attendee,
        };
        assert_eq!(err.error_message(), "This endpoint requires the 'admin' role");
    }
}
