// HTTP handlers for payment endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::payments::{CheckoutResponse, PaymentError};
use crate::AppState;

/// Handler for POST /api/registrations/{id}/checkout
/// Opens a gateway checkout for the registered total
#[utoipa::path(
    post,
    path = "/api/registrations/{id}/checkout",
    params(
        ("id" = Uuid, Path, description = "Registration ID")
    ),
    responses(
        (status = 200, description = "Checkout opened", body = CheckoutResponse),
        (status = 403, description = "Not your registration"),
        (status = 404, description = "Registration not found"),
        (status = 409, description = "Registration is not awaiting payment"),
        (status = 502, description = "Gateway amount did not match the registration"),
        (status = 503, description = "Gateway unavailable, safe to retry")
    ),
    tag = "payments"
)]
pub async fn checkout_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutResponse>, PaymentError> {
    tracing::debug!("Checkout requested by {} for {}", user.user_id, id);

    let response = state.payments.checkout(id, &user).await?;
    Ok(Json(response))
}
